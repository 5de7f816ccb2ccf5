use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::entities::record::{Record, RecordFields};
use crate::infra::export::csv::{columns_for, export_csv};

pub struct ExportService {
    columns: Vec<String>,
}

impl ExportService {
    /// An empty column list exports every field seen in the records.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn export_to_path(&self, path: &Path, records: &[Record]) -> Result<usize> {
        let file = File::create(path)
            .with_context(|| format!("failed to create export file: {}", path.display()))?;
        let written = self.export_to_writer(BufWriter::new(file), records)?;
        info!(path = %path.display(), rows = written, "exported view");
        Ok(written)
    }

    pub fn export_to_writer<W: std::io::Write>(&self, writer: W, records: &[Record]) -> Result<usize> {
        let columns = if self.columns.is_empty() {
            columns_for(records)
        } else {
            self.columns.clone()
        };
        export_csv(writer, &columns, records, &RecordFields)
    }
}
