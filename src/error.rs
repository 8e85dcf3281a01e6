//! Failure kinds of a fetch-and-persist run.
//!
//! Every variant except [`JobError::Persist`] ends the run with exit status 1.
//! A persistence failure only becomes fatal when `output.strict_persist` is set.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    /// The snapshot directory could not be created
    #[error("Error setting up directory {}: {source}", .path.display())]
    DirectorySetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Connection failure or non-2xx status
    #[error("Request error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Body was not valid JSON
    #[error("Data error: {0}")]
    Data(#[source] serde_json::Error),

    /// JSON parsed but the `fear_and_greed` record is missing or malformed
    #[error("Unexpected JSON structure: {reason}")]
    Schema { reason: String },

    /// Anything else raised while fetching
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),

    /// Snapshot file could not be written
    #[error("Failed to save data to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JobError {
    pub fn schema(reason: impl Into<String>) -> Self {
        JobError::Schema {
            reason: reason.into(),
        }
    }

    /// Whether this kind ends the run under the default policy.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, JobError::Persist { .. })
    }

    /// Process status for an error that escaped the run. A persistence error
    /// only escapes under `strict_persist`, at which point it fails the run too.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn only_persist_is_non_fatal() {
        let persist = JobError::Persist {
            path: PathBuf::from("x.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!persist.is_fatal());
        assert_eq!(persist.exit_code(), 1);

        let dir = JobError::DirectorySetup {
            path: PathBuf::from("d"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(dir.is_fatal());
        assert!(JobError::schema("missing `fear_and_greed`").is_fatal());
        assert!(JobError::Unexpected("boom".into()).is_fatal());
        assert_eq!(JobError::schema("x").exit_code(), 1);
    }
}
