use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entities::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    pub source: String,
    pub records: Vec<Record>,
    pub fetched_at: DateTime<Utc>,
    /// The source held more records than the fetch limit allowed.
    pub truncated: bool,
}

impl RecordBatch {
    pub fn bounded(source: impl Into<String>, mut records: Vec<Record>, limit: Option<usize>) -> Self {
        let truncated = match limit {
            Some(limit) if records.len() > limit => {
                records.truncate(limit);
                true
            }
            _ => false,
        };
        Self {
            source: source.into(),
            records,
            fetched_at: Utc::now(),
            truncated,
        }
    }
}

pub trait RecordSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches at most `limit` records; `None` means unbounded.
    fn fetch(&self, limit: Option<usize>) -> Result<RecordBatch, SourceError>;
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, limit: Option<usize>) -> Result<RecordBatch, SourceError> {
        (**self).fetch(limit)
    }
}
