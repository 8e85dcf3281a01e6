use crate::error::JobError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One snapshot of the index as published upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexReading {
    /// Kept as the upstream JSON number so `61` is not rewritten as `61.0`.
    pub score: serde_json::Number,
    pub rating: String,
    pub timestamp: Timestamp,
}

/// Upstream generation time, written back in whatever JSON type it arrived as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(serde_json::Number),
    Text(String),
}

impl From<i64> for Timestamp {
    fn from(v: i64) -> Self {
        Timestamp::Epoch(v.into())
    }
}

/// Pulls `fear_and_greed.{score,rating,timestamp}` out of the graph-data document.
///
/// No defaulting: a missing or mistyped field rejects the whole document.
pub fn extract_reading(doc: &Value) -> Result<IndexReading, JobError> {
    let record = doc
        .get("fear_and_greed")
        .ok_or_else(|| JobError::schema("missing `fear_and_greed`"))?;
    if !record.is_object() {
        return Err(JobError::schema("`fear_and_greed` is not an object"));
    }

    let score = match record.get("score") {
        Some(Value::Number(n)) => n.clone(),
        Some(_) => return Err(JobError::schema("`fear_and_greed.score` is not a number")),
        None => return Err(JobError::schema("missing `fear_and_greed.score`")),
    };

    let rating = record
        .get("rating")
        .ok_or_else(|| JobError::schema("missing `fear_and_greed.rating`"))?
        .as_str()
        .ok_or_else(|| JobError::schema("`fear_and_greed.rating` is not a string"))?
        .to_string();

    let timestamp = match record.get("timestamp") {
        Some(Value::Number(n)) => Timestamp::Epoch(n.clone()),
        Some(Value::String(s)) => Timestamp::Text(s.clone()),
        Some(_) => {
            return Err(JobError::schema(
                "`fear_and_greed.timestamp` is not a number or string",
            ));
        }
        None => return Err(JobError::schema("missing `fear_and_greed.timestamp`")),
    };

    Ok(IndexReading {
        score,
        rating,
        timestamp,
    })
}
