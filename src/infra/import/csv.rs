use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use csv::StringRecord;
use tracing::debug;

use crate::domain::entities::record::{FieldValue, Record};
use crate::usecase::ports::source::{RecordBatch, RecordSource, SourceError};

pub struct CsvSource {
    name: String,
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: source_name_from_path(&path),
            path,
        }
    }
}

impl RecordSource for CsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, limit: Option<usize>) -> Result<RecordBatch, SourceError> {
        if !self.path.exists() {
            return Err(SourceError::NotFound(self.path.display().to_string()));
        }
        let (records, truncated) =
            read_csv_records(&self.path, limit).map_err(|err| SourceError::Parse(format!("{err:#}")))?;
        debug!(
            source = %self.name,
            count = records.len(),
            truncated,
            "fetched csv records"
        );

        Ok(RecordBatch {
            source: self.name.clone(),
            records,
            fetched_at: Utc::now(),
            truncated,
        })
    }
}

pub fn source_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("dataset")
        .to_string()
}

/// Returns the parsed records and whether rows beyond `limit` were left unread.
pub fn read_csv_records(csv_path: &Path, limit: Option<usize>) -> Result<(Vec<Record>, bool)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers from csv: {}", csv_path.display()))?
        .clone();

    if headers.is_empty() {
        anyhow::bail!("csv header is required")
    }

    let mut records = Vec::new();
    for (row_idx, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("failed to parse csv record {}", row_idx + 1))?;
        if limit.is_some_and(|limit| records.len() >= limit) {
            return Ok((records, true));
        }
        records.push(record_from_row(&headers, &row));
    }

    Ok((records, false))
}

fn record_from_row(headers: &StringRecord, row: &StringRecord) -> Record {
    headers
        .iter()
        .enumerate()
        .map(|(col_idx, name)| {
            let value = row
                .get(col_idx)
                .map(|value| FieldValue::Text(value.to_string()))
                .unwrap_or(FieldValue::Null);
            (name, value)
        })
        .collect()
}
