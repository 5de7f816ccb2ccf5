pub mod csv;
pub mod xlsx;

use std::path::Path;

use crate::usecase::ports::source::{RecordSource, SourceError};

use self::csv::CsvSource;
use self::xlsx::XlsxSource;

/// Picks a file-backed source by extension.
pub fn open_source(path: &Path, sheet: Option<String>) -> Result<Box<dyn RecordSource>, SourceError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(Box::new(CsvSource::new(path))),
        "xlsx" | "xlsm" | "xls" | "ods" => Ok(Box::new(XlsxSource::new(path, sheet))),
        _ => Err(SourceError::Parse(format!(
            "unsupported file type: {}",
            path.display()
        ))),
    }
}
