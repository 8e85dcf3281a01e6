use super::IndexSource;
use crate::{
    config::{Config, Http},
    error::JobError,
};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Client construction is deferred to `fetch` so its failures land inside the run.
pub struct HttpSource {
    http: Http,
}

impl HttpSource {
    pub fn new(cfg: &Config) -> Self {
        Self {
            http: cfg.http.clone(),
        }
    }

    fn client(&self) -> Result<Client, JobError> {
        // The blocking client defaults to a 30s timeout; 0 means really unbounded.
        let timeout = match self.http.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let mut builder = Client::builder()
            .user_agent(self.http.user_agent.as_str())
            .timeout(timeout);
        if !self.http.use_system_proxy {
            builder = builder.no_proxy();
        }
        builder
            .build()
            .map_err(|e| JobError::Unexpected(format!("building HTTP client: {e}")))
    }
}

impl IndexSource for HttpSource {
    fn fetch(&self) -> Result<Value, JobError> {
        let client = self.client()?;
        debug!("GET {}", self.http.url);
        let resp = client
            .get(&self.http.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(JobError::Transport)?;
        debug!("status {}", resp.status());

        let body = resp.bytes().map_err(JobError::Transport)?;
        let doc: Value = serde_json::from_slice(&body).map_err(JobError::Data)?;
        info!("Successfully fetched data from the URL");
        Ok(doc)
    }
}
