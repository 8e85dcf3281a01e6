use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_URL: &str = "https://production.dataviz.cnn.io/index/fearandgreed/graphdata";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Directory (relative to the working directory) holding one snapshot per run.
pub const DATA_DIR_NAME: &str = "feargreed_data";
/// Log file name (relative to the working directory).
pub const LOG_FILE_NAME: &str = "feargreed.log";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Http {
    pub url: String,
    pub user_agent: String,
    /// 0 leaves the request unbounded.
    pub timeout_seconds: u64,
    /// Honour HTTP(S)_PROXY from the environment.
    pub use_system_proxy: bool,
}
impl Default for Http {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout_seconds: 0,
            use_system_proxy: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    /// Treat a failed snapshot write as fatal instead of logging and carrying on.
    pub strict_persist: bool,
    pub indent: usize,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            strict_persist: false,
            indent: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub max_bytes: u64,
    pub backup_count: usize,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "debug".into(),
            json: false,
            max_bytes: 5 * 1024 * 1024,
            backup_count: 5,
        }
    }
}
