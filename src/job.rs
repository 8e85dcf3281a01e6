use crate::{
    config::Config,
    error::JobError,
    reading::{extract_reading, IndexReading},
    source::IndexSource,
    util::{ensure_dir, write_json_indented, Clock},
};
use std::path::{Path, PathBuf};
use time::{macros::format_description, OffsetDateTime};
use tracing::{debug, error, info};

/// One fetch-and-persist cycle: ensure dir, fetch, extract, write.
pub struct Job<S: IndexSource, C: Clock> {
    cfg: Config,
    source: S,
    clock: C,
    data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Saved(PathBuf),
    /// Write failed and `strict_persist` is off; the run still counts as complete.
    PersistFailed(PathBuf),
}

impl<S: IndexSource, C: Clock> Job<S, C> {
    pub fn new(cfg: &Config, source: S, clock: C, data_dir: &Path) -> Self {
        Self {
            cfg: cfg.clone(),
            source,
            clock,
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn run(&self) -> Result<JobOutcome, JobError> {
        info!("Script started");
        let res = self.run_steps();
        if let Err(err) = &res {
            error!("{err}");
        }
        info!("Script finished");
        res
    }

    fn run_steps(&self) -> Result<JobOutcome, JobError> {
        self.ensure_output_dir()?;
        let reading = self.fetch_reading()?;
        debug!(?reading, "extracted reading");
        self.persist(&reading)
    }

    pub fn ensure_output_dir(&self) -> Result<(), JobError> {
        let created = ensure_dir(&self.data_dir).map_err(|source| JobError::DirectorySetup {
            path: self.data_dir.clone(),
            source,
        })?;
        if created {
            info!("Directory {} created successfully.", self.data_dir.display());
        }
        Ok(())
    }

    pub fn fetch_reading(&self) -> Result<IndexReading, JobError> {
        let doc = self.source.fetch()?;
        extract_reading(&doc)
    }

    pub fn persist(&self, reading: &IndexReading) -> Result<JobOutcome, JobError> {
        let path = self.data_dir.join(output_file_name(self.clock.now())?);

        match write_json_indented(&path, reading, self.cfg.output.indent) {
            Ok(()) => {
                info!("Data saved to {}", path.display());
                Ok(JobOutcome::Saved(path))
            }
            Err(source) => {
                let err = JobError::Persist {
                    path: path.clone(),
                    source,
                };
                if err.is_fatal() || self.cfg.output.strict_persist {
                    return Err(err);
                }
                error!("{err}");
                Ok(JobOutcome::PersistFailed(path))
            }
        }
    }
}

/// 0 once the sequence reaches its end (including a swallowed write failure), 1 otherwise.
pub fn exit_code(result: &Result<JobOutcome, JobError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => err.exit_code(),
    }
}

/// `fear_and_greed_YYYYMMDD_HHMMSS.json`. Two runs inside one second share a name.
pub fn output_file_name(at: OffsetDateTime) -> Result<String, JobError> {
    let fmt = format_description!("fear_and_greed_[year][month][day]_[hour][minute][second].json");
    at.format(&fmt)
        .map_err(|e| JobError::Unexpected(format!("formatting file name: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn file_name_is_second_resolution() {
        let name = output_file_name(datetime!(2025-01-01 12:00:00.999 +01:00)).unwrap();
        assert_eq!(name, "fear_and_greed_20250101_120000.json");
    }

    #[test]
    fn file_name_zero_pads() {
        let name = output_file_name(datetime!(2024-03-05 07:08:09 UTC)).unwrap();
        assert_eq!(name, "fear_and_greed_20240305_070809.json");
    }
}
