use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::entities::record::{Record, RecordFields};
use crate::domain::entities::view::{ViewResult, ViewSpec};
use crate::domain::pipeline::{DataViewPipeline, ViewError};
use crate::usecase::ports::source::{RecordBatch, RecordSource, SourceError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewServiceError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    View(#[from] ViewError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourcedView {
    pub source: String,
    pub result: ViewResult<Record>,
    pub fetched_at: DateTime<Utc>,
    pub fetched: usize,
    /// Totals only cover the fetched batch, not the whole remote collection.
    pub truncated: bool,
}

impl SourcedView {
    pub fn summary(&self) -> String {
        let summary = self.result.summary();
        if self.truncated {
            format!("{summary} (searched first {} records only)", self.fetched)
        } else {
            summary
        }
    }
}

pub struct ViewService {
    source: Arc<dyn RecordSource>,
    pipeline: DataViewPipeline<RecordFields>,
    fetch_limit: Option<usize>,
}

impl ViewService {
    pub fn new(source: Arc<dyn RecordSource>, fetch_limit: Option<usize>) -> Self {
        Self {
            source,
            pipeline: DataViewPipeline::new(RecordFields),
            fetch_limit,
        }
    }

    pub fn load(&self) -> Result<RecordBatch, SourceError> {
        let batch = self.source.fetch(self.fetch_limit)?;
        if batch.truncated {
            warn!(
                source = %batch.source,
                limit = ?self.fetch_limit,
                "source holds more records than the fetch limit; paging covers the fetched batch only"
            );
        }
        Ok(batch)
    }

    pub fn view(&self, batch: &RecordBatch, spec: &ViewSpec) -> Result<SourcedView, ViewError> {
        let result = self.pipeline.compute_view(&batch.records, spec)?;
        debug!(
            source = %batch.source,
            total_items = result.total_items,
            page = result.page,
            "view computed"
        );
        Ok(SourcedView {
            source: batch.source.clone(),
            result,
            fetched_at: batch.fetched_at,
            fetched: batch.records.len(),
            truncated: batch.truncated,
        })
    }

    pub fn fetch_view(&self, spec: &ViewSpec) -> Result<SourcedView, ViewServiceError> {
        let batch = self.load()?;
        Ok(self.view(&batch, spec)?)
    }

    pub fn filter_options(&self, batch: &RecordBatch, field: &str) -> Vec<String> {
        self.pipeline.filter_options(&batch.records, field)
    }
}
