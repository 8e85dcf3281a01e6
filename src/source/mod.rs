pub mod http;

use crate::error::JobError;
use serde_json::Value;

pub use http::HttpSource;

/// Where the raw graph-data document comes from.
pub trait IndexSource {
    /// One attempt, no retry. Returns the parsed JSON body.
    fn fetch(&self) -> Result<Value, JobError>;
}
