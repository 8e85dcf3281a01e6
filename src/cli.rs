use crate::{
    config::{Config, DATA_DIR_NAME, LOG_FILE_NAME},
    job::{exit_code, Job},
    logging::SizeRotatingFile,
    source::HttpSource,
    util::LocalClock,
};
use anyhow::{anyhow, Context, Result};
use clap::{
    error::{ContextKind, ContextValue, ErrorKind},
    Parser,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use time::{format_description::well_known::Rfc3339, UtcOffset};
use tracing::{debug, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{time::OffsetTime, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

#[derive(Parser, Debug)]
#[command(name = "fearandgreed")]
#[command(about = "Fetch the CNN Fear & Greed index once and store it as a timestamped JSON file")]
pub struct Args {
    /// Mirror log output to the console.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config TOML. If omitted, uses ./fearandgreed.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// HTTP timeout in seconds; 0 waits indefinitely.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Exit non-zero when the snapshot file cannot be written.
    #[arg(long)]
    pub strict_persist: bool,

    /// Arguments dropped by `parse_lenient`.
    #[arg(skip)]
    pub ignored: Vec<String>,
}

impl Args {
    /// Like `try_parse_from`, but unrecognised arguments are dropped instead of
    /// failing, so `-v` is honoured wherever it appears.
    pub fn parse_lenient<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        let mut ignored = Vec::new();
        loop {
            let err = match Args::try_parse_from(argv.iter()) {
                Ok(mut args) => {
                    args.ignored = ignored;
                    return Ok(args);
                }
                Err(err) if err.kind() == ErrorKind::UnknownArgument => err,
                Err(err) => return Err(err),
            };
            let Some(ContextValue::String(bad)) = err.get(ContextKind::InvalidArg) else {
                return Err(err);
            };
            let with_value = format!("{bad}=");
            let pos = argv.iter().skip(1).position(|a| {
                a.to_str()
                    .is_some_and(|a| a == bad.as_str() || a.starts_with(&with_value))
            });
            let Some(pos) = pos else {
                return Err(err);
            };
            ignored.push(argv.remove(pos + 1).to_string_lossy().into_owned());
        }
    }
}

pub fn dispatch(args: Args) -> Result<i32> {
    // Must run before the log appender spawns its worker thread.
    let clock = LocalClock::detect();
    let cwd = std::env::current_dir().with_context(|| "current_dir")?;

    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    apply_overrides(&args, &mut cfg);

    let _guard = init_logging(&args, &cfg, &cwd.join(LOG_FILE_NAME), clock.offset())?;
    if !args.ignored.is_empty() {
        debug!("ignoring arguments: {:?}", args.ignored);
    }

    let job = Job::new(&cfg, HttpSource::new(&cfg), clock, &cwd.join(DATA_DIR_NAME));
    let res = job.run();
    Ok(exit_code(&res))
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("fearandgreed.toml");
    default.exists().then_some(default)
}

pub fn apply_overrides(args: &Args, cfg: &mut Config) {
    if let Some(level) = &args.log_level {
        cfg.logging.level = level.clone();
    }
    if let Some(secs) = args.timeout_secs {
        cfg.http.timeout_seconds = secs;
    }
    if args.strict_persist {
        cfg.output.strict_persist = true;
    }
}

fn init_logging(
    args: &Args,
    cfg: &Config,
    file_path: &Path,
    offset: UtcOffset,
) -> Result<WorkerGuard> {
    let (subscriber, guard) = build_subscriber(args, cfg, file_path, offset, std::io::stdout)?;
    subscriber
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;
    Ok(guard)
}

/// Rotating file sink always; `console` only in verbose mode.
fn build_subscriber<C>(
    args: &Args,
    cfg: &Config,
    file_path: &Path,
    offset: UtcOffset,
    console: C,
) -> Result<(impl Subscriber + Send + Sync + 'static, WorkerGuard)>
where
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level));

    let file = SizeRotatingFile::open(file_path, cfg.logging.max_bytes, cfg.logging.backup_count)
        .with_context(|| format!("open log file: {}", file_path.display()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let file_layer = fmt_layer(cfg.logging.json, offset, non_blocking);

    let console_layer = args
        .verbose
        .then(|| fmt_layer(cfg.logging.json, offset, console));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);

    Ok((subscriber, guard))
}

fn fmt_layer<S, W>(json: bool, offset: UtcOffset, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let timer = OffsetTime::new(offset, Rfc3339);
    if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_timer(timer)
            .with_writer(writer)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_timer(timer)
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing::info;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn log_through(argv: &[&str]) -> (String, String) {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join(LOG_FILE_NAME);
        let console = Captured::default();
        let args = Args::parse_lenient(argv.iter().copied()).unwrap();

        let (subscriber, guard) = build_subscriber(
            &args,
            &Config::default(),
            &log_path,
            UtcOffset::UTC,
            console.clone(),
        )
        .unwrap();
        tracing::subscriber::with_default(subscriber, || info!("Script started"));
        drop(guard);

        (std::fs::read_to_string(&log_path).unwrap(), console.text())
    }

    #[test]
    fn verbose_mirrors_log_to_console() {
        let (file, console) = log_through(&["fearandgreed", "-v"]);
        assert!(file.contains("Script started"));
        assert!(console.contains("Script started"));
    }

    #[test]
    fn quiet_run_logs_to_file_only() {
        let (file, console) = log_through(&["fearandgreed"]);
        assert!(file.contains("Script started"));
        assert!(console.is_empty());
    }

    #[test]
    fn unknown_arguments_are_dropped() {
        let args = Args::parse_lenient(["fearandgreed", "now", "-v"]).unwrap();
        assert!(args.verbose);
        assert_eq!(args.ignored, vec!["now".to_string()]);

        let args = Args::parse_lenient(["fearandgreed", "--quiet", "-v", "--strict-persist"]).unwrap();
        assert!(args.verbose);
        assert!(args.strict_persist);
        assert_eq!(args.ignored, vec!["--quiet".to_string()]);

        let args = Args::parse_lenient(["fearandgreed", "--color=never"]).unwrap();
        assert!(!args.verbose);
        assert_eq!(args.ignored, vec!["--color=never".to_string()]);
    }

    #[test]
    fn malformed_known_flag_still_errors() {
        let err = Args::parse_lenient(["fearandgreed", "--timeout-secs", "soon"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn verbose_flag_anywhere() {
        let args = Args::try_parse_from(["fearandgreed", "--strict-persist", "-v"]).unwrap();
        assert!(args.verbose);
        assert!(args.strict_persist);

        let args = Args::try_parse_from(["fearandgreed"]).unwrap();
        assert!(!args.verbose);
    }

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "fearandgreed",
            "--timeout-secs",
            "20",
            "--log-level",
            "warn",
        ])
        .unwrap();
        let mut cfg = Config::default();
        apply_overrides(&args, &mut cfg);
        assert_eq!(cfg.http.timeout_seconds, 20);
        assert_eq!(cfg.logging.level, "warn");
        assert!(!cfg.output.strict_persist);
    }
}
