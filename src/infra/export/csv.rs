use std::io::Write;

use anyhow::{Context, Result};

use crate::domain::entities::record::{FieldAccessor, Record};

pub fn export_csv<W, T, A>(writer: W, columns: &[String], items: &[T], accessor: &A) -> Result<usize>
where
    W: Write,
    A: FieldAccessor<T>,
{
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(columns)
        .context("failed to write csv header")?;

    for (row_idx, item) in items.iter().enumerate() {
        let row: Vec<String> = columns
            .iter()
            .map(|column| {
                accessor
                    .field_text(item, column)
                    .map(|value| value.into_owned())
                    .unwrap_or_default()
            })
            .collect();
        writer
            .write_record(&row)
            .with_context(|| format!("failed to write csv row {row_idx}"))?;
    }

    writer.flush().context("failed to flush csv output")?;
    Ok(items.len())
}

/// Field names in order of first appearance across `records`.
pub fn columns_for(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for name in record.field_names() {
            if !columns.iter().any(|column| column == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}
