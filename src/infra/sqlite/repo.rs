use std::path::PathBuf;

use tracing::{info, warn};

use crate::infra::sqlite::queries::{load_latest_snapshot, save_snapshot};
use crate::usecase::ports::source::{RecordBatch, RecordSource, SourceError};

pub struct SnapshotSource {
    pub db_path: PathBuf,
    pub source_name: String,
}

impl RecordSource for SnapshotSource {
    fn name(&self) -> &str {
        &self.source_name
    }

    fn fetch(&self, limit: Option<usize>) -> Result<RecordBatch, SourceError> {
        let snapshot = load_latest_snapshot(&self.db_path, &self.source_name)
            .map_err(|err| SourceError::Storage(format!("{err:#}")))?
            .ok_or_else(|| SourceError::NotFound(format!("snapshot of {}", self.source_name)))?;

        Ok(rebound(snapshot, limit))
    }
}

/// Saves every successful fetch of `inner` and falls back to the last saved
/// snapshot when `inner` fails.
pub struct CachingSource<S> {
    inner: S,
    db_path: PathBuf,
}

impl<S: RecordSource> CachingSource<S> {
    pub fn new(inner: S, db_path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            db_path: db_path.into(),
        }
    }
}

impl<S: RecordSource> RecordSource for CachingSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, limit: Option<usize>) -> Result<RecordBatch, SourceError> {
        match self.inner.fetch(limit) {
            Ok(batch) => {
                match save_snapshot(&self.db_path, &batch) {
                    Ok(snapshot_id) => info!(
                        source = %batch.source,
                        snapshot_id,
                        count = batch.records.len(),
                        "saved snapshot"
                    ),
                    Err(err) => warn!(source = %batch.source, "failed to save snapshot: {err:#}"),
                }
                Ok(batch)
            }
            Err(fetch_err) => {
                warn!(source = %self.name(), "fetch failed, trying snapshot: {fetch_err}");
                let snapshot = load_latest_snapshot(&self.db_path, self.name())
                    .map_err(|err| SourceError::Storage(format!("{err:#}")))?;
                match snapshot {
                    Some(snapshot) => Ok(rebound(snapshot, limit)),
                    None => Err(fetch_err),
                }
            }
        }
    }
}

fn rebound(mut snapshot: RecordBatch, limit: Option<usize>) -> RecordBatch {
    if let Some(limit) = limit {
        if snapshot.records.len() > limit {
            snapshot.records.truncate(limit);
            snapshot.truncated = true;
        }
    }
    snapshot
}
