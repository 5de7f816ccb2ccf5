use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::domain::entities::record::{FieldValue, Record};
use crate::infra::sqlite::schema::{init_db, open_connection};
use crate::usecase::ports::source::RecordBatch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMeta {
    pub id: i64,
    pub source_name: String,
    pub fetched_at: DateTime<Utc>,
    pub truncated: bool,
    pub row_count: i64,
}

fn encode_value(value: &FieldValue) -> (&'static str, String) {
    match value {
        FieldValue::Text(text) => ("text", text.clone()),
        FieldValue::Integer(number) => ("integer", number.to_string()),
        FieldValue::Number(number) => ("number", number.to_string()),
        FieldValue::Bool(flag) => ("bool", flag.to_string()),
        FieldValue::Null => ("null", String::new()),
    }
}

fn decode_value(kind: &str, value: String) -> Result<FieldValue> {
    Ok(match kind {
        "text" => FieldValue::Text(value),
        "integer" => FieldValue::Integer(
            value
                .parse()
                .with_context(|| format!("invalid integer in snapshot cell: {value}"))?,
        ),
        "number" => FieldValue::Number(
            value
                .parse()
                .with_context(|| format!("invalid number in snapshot cell: {value}"))?,
        ),
        "bool" => FieldValue::Bool(value == "true"),
        "null" => FieldValue::Null,
        other => anyhow::bail!("unknown snapshot cell kind: {other}"),
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("invalid snapshot timestamp: {value}"))
}

pub fn save_snapshot(db_path: &Path, batch: &RecordBatch) -> Result<i64> {
    init_db(db_path)?;
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start snapshot transaction")?;

    tx.execute(
        "INSERT INTO snapshot(source_name, fetched_at, truncated, row_count)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            batch.source,
            batch.fetched_at.to_rfc3339(),
            batch.truncated,
            batch.records.len() as i64
        ],
    )
    .context("failed to insert snapshot")?;
    let snapshot_id = tx.last_insert_rowid();

    let field_names: BTreeSet<&str> = batch
        .records
        .iter()
        .flat_map(Record::field_names)
        .collect();
    let col_of: HashMap<&str, i64> = field_names
        .iter()
        .enumerate()
        .map(|(col_idx, name)| (*name, col_idx as i64))
        .collect();

    let mut insert_field = tx
        .prepare("INSERT INTO field_name(snapshot_id, col_idx, name) VALUES (?1, ?2, ?3)")
        .context("failed to prepare field name insert")?;
    for (name, col_idx) in &col_of {
        insert_field
            .execute(params![snapshot_id, col_idx, name])
            .context("failed to insert field name")?;
    }
    drop(insert_field);

    let mut insert_cell = tx
        .prepare(
            "INSERT INTO cell(snapshot_id, row_idx, col_idx, kind, value)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .context("failed to prepare cell insert")?;
    for (row_idx, record) in batch.records.iter().enumerate() {
        for name in record.field_names() {
            let (Some(col_idx), Some(value)) = (col_of.get(name), record.get(name)) else {
                continue;
            };
            let (kind, text) = encode_value(value);
            insert_cell
                .execute(params![snapshot_id, row_idx as i64, col_idx, kind, text])
                .context("failed to insert cell")?;
        }
    }
    drop(insert_cell);

    tx.commit().context("failed to commit snapshot transaction")?;
    Ok(snapshot_id)
}

pub fn load_latest_snapshot(db_path: &Path, source_name: &str) -> Result<Option<RecordBatch>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;

    let meta = conn
        .query_row(
            "SELECT id, fetched_at, truncated, row_count
             FROM snapshot
             WHERE source_name = ?1
             ORDER BY id DESC
             LIMIT 1",
            params![source_name],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()
        .context("failed to query latest snapshot")?;
    let Some((snapshot_id, fetched_at, truncated, row_count)) = meta else {
        return Ok(None);
    };

    let mut fields_stmt = conn
        .prepare(
            "SELECT col_idx, name
             FROM field_name
             WHERE snapshot_id = ?1",
        )
        .context("failed to prepare field names query")?;
    let field_names = fields_stmt
        .query_map([snapshot_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .context("failed to query field names")?
        .collect::<rusqlite::Result<HashMap<_, _>>>()
        .context("failed to collect field names")?;
    drop(fields_stmt);

    let mut records = vec![Record::new(); usize::try_from(row_count).unwrap_or_default()];
    let mut cells_stmt = conn
        .prepare(
            "SELECT row_idx, col_idx, kind, value
             FROM cell
             WHERE snapshot_id = ?1
             ORDER BY row_idx ASC, col_idx ASC",
        )
        .context("failed to prepare snapshot cells query")?;
    let mut cells = cells_stmt
        .query([snapshot_id])
        .context("failed to run snapshot cells query")?;

    while let Some(row) = cells.next().context("failed to read snapshot cell")? {
        let row_idx: i64 = row.get(0).context("failed to read row_idx")?;
        let col_idx: i64 = row.get(1).context("failed to read col_idx")?;
        let kind: String = row.get(2).context("failed to read kind")?;
        let value: String = row.get(3).context("failed to read value")?;

        let Some(name) = field_names.get(&col_idx) else {
            anyhow::bail!("snapshot #{snapshot_id} has a cell for unknown column {col_idx}");
        };
        if let Some(record) = usize::try_from(row_idx)
            .ok()
            .and_then(|idx| records.get_mut(idx))
        {
            record.insert(name.clone(), decode_value(&kind, value)?);
        }
    }

    Ok(Some(RecordBatch {
        source: source_name.to_string(),
        records,
        fetched_at: parse_timestamp(&fetched_at)?,
        truncated,
    }))
}

pub fn list_snapshots(db_path: &Path) -> Result<Vec<SnapshotMeta>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT id, source_name, fetched_at, truncated, row_count
             FROM snapshot
             ORDER BY id DESC",
        )
        .context("failed to prepare snapshots query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })
        .context("failed to query snapshots")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect snapshots")?;

    rows.into_iter()
        .map(|(id, source_name, fetched_at, truncated, row_count)| {
            Ok(SnapshotMeta {
                id,
                source_name,
                fetched_at: parse_timestamp(&fetched_at)?,
                truncated,
                row_count,
            })
        })
        .collect()
}

/// Deletes every snapshot of `source_name`; returns how many were removed.
pub fn purge_snapshots(db_path: &Path, source_name: &str) -> Result<usize> {
    init_db(db_path)?;
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start purge transaction")?;
    tx.execute(
        "DELETE FROM cell
         WHERE snapshot_id IN (SELECT id FROM snapshot WHERE source_name = ?1)",
        params![source_name],
    )
    .with_context(|| format!("failed to delete cells for source {source_name}"))?;
    tx.execute(
        "DELETE FROM field_name
         WHERE snapshot_id IN (SELECT id FROM snapshot WHERE source_name = ?1)",
        params![source_name],
    )
    .with_context(|| format!("failed to delete field names for source {source_name}"))?;
    let removed = tx
        .execute(
            "DELETE FROM snapshot WHERE source_name = ?1",
            params![source_name],
        )
        .with_context(|| format!("failed to delete snapshots for source {source_name}"))?;
    tx.commit().context("failed to commit purge transaction")?;
    Ok(removed)
}
