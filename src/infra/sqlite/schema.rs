use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS snapshot (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            source_name TEXT NOT NULL,
            fetched_at  TEXT NOT NULL,
            truncated   INTEGER NOT NULL,
            row_count   INTEGER NOT NULL,
            saved_at    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS field_name (
            snapshot_id INTEGER NOT NULL,
            col_idx     INTEGER NOT NULL,
            name        TEXT NOT NULL,
            PRIMARY KEY (snapshot_id, col_idx),
            FOREIGN KEY (snapshot_id) REFERENCES snapshot(id)
        );

        CREATE TABLE IF NOT EXISTS cell (
            snapshot_id INTEGER NOT NULL,
            row_idx     INTEGER NOT NULL,
            col_idx     INTEGER NOT NULL,
            kind        TEXT NOT NULL,
            value       TEXT NOT NULL,
            PRIMARY KEY (snapshot_id, row_idx, col_idx),
            FOREIGN KEY (snapshot_id) REFERENCES snapshot(id)
        );

        CREATE INDEX IF NOT EXISTS idx_snapshot_source
            ON snapshot(source_name, id);

        CREATE INDEX IF NOT EXISTS idx_cell_snapshot_row
            ON cell(snapshot_id, row_idx);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
