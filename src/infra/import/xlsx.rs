use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::domain::entities::record::{FieldValue, Record};
use crate::infra::import::csv::source_name_from_path;
use crate::usecase::ports::source::{RecordBatch, RecordSource, SourceError};

pub fn cell_to_field_value(cell: &Data) -> FieldValue {
    match cell {
        Data::String(v) => FieldValue::Text(v.to_string()),
        Data::Float(v) => FieldValue::Number(*v),
        Data::Int(v) => FieldValue::Integer(*v),
        Data::Bool(v) => FieldValue::Bool(*v),
        Data::DateTime(v) => FieldValue::Text(v.to_string()),
        Data::DateTimeIso(v) => FieldValue::Text(v.to_string()),
        Data::DurationIso(v) => FieldValue::Text(v.to_string()),
        Data::Error(v) => FieldValue::Text(format!("{v:?}")),
        Data::Empty => FieldValue::Null,
    }
}

pub struct XlsxSource {
    name: String,
    path: PathBuf,
    sheet: Option<String>,
}

impl XlsxSource {
    /// Uses the first worksheet when `sheet` is `None`.
    pub fn new(path: impl Into<PathBuf>, sheet: Option<String>) -> Self {
        let path = path.into();
        let stem = source_name_from_path(&path);
        let name = match &sheet {
            Some(sheet) => format!("{stem}#{sheet}"),
            None => stem,
        };
        Self { name, path, sheet }
    }
}

impl RecordSource for XlsxSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, limit: Option<usize>) -> Result<RecordBatch, SourceError> {
        if !self.path.exists() {
            return Err(SourceError::NotFound(self.path.display().to_string()));
        }
        let rows = read_sheet_rows(&self.path, self.sheet.as_deref())
            .map_err(|err| SourceError::Parse(format!("{err:#}")))?;
        let records = records_from_rows(&rows)
            .map_err(|err| SourceError::Parse(format!("{err:#}")))?;
        debug!(source = %self.name, count = records.len(), "fetched worksheet records");

        Ok(RecordBatch::bounded(self.name.clone(), records, limit))
    }
}

fn read_sheet_rows(xlsx_path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<FieldValue>>> {
    let mut workbook = open_workbook_auto(xlsx_path)
        .with_context(|| format!("failed to open workbook: {}", xlsx_path.display()))?;

    let sheet_name = match sheet {
        Some(sheet) => sheet.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .with_context(|| format!("workbook has no sheets: {}", xlsx_path.display()))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet: {sheet_name}"))?;

    Ok(range
        .rows()
        .map(|r| r.iter().map(cell_to_field_value).collect::<Vec<_>>())
        .collect())
}

/// Blank header cells get positional names (`column_3`) so no value is lost.
pub fn records_from_rows(rows: &[Vec<FieldValue>]) -> Result<Vec<Record>> {
    let Some((header, body)) = rows.split_first() else {
        anyhow::bail!("worksheet header is required")
    };
    let headers: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(col_idx, cell)| {
            let name = cell.to_field_string().trim().to_string();
            if name.is_empty() {
                format!("column_{}", col_idx + 1)
            } else {
                name
            }
        })
        .collect();

    Ok(body
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.is_null()))
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(col_idx, name)| {
                    let value = row.get(col_idx).cloned().unwrap_or(FieldValue::Null);
                    (name.clone(), value)
                })
                .collect::<Record>()
        })
        .collect())
}
