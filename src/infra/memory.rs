use crate::domain::entities::record::Record;
use crate::usecase::ports::source::{RecordBatch, RecordSource, SourceError};

pub struct MemorySource {
    name: String,
    records: Vec<Record>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, limit: Option<usize>) -> Result<RecordBatch, SourceError> {
        Ok(RecordBatch::bounded(
            self.name.clone(),
            self.records.clone(),
            limit,
        ))
    }
}
