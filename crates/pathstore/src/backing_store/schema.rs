//! Table layout and the low-level sanity checks SQLite itself can run for us.

use rusqlite::Connection;
use tracing::debug;

use crate::error::Error;
use crate::tree::ROOT_ID;

/// `entries` holds both the root (id 0, parent 0, name "") and every other node. `parent`
/// carries a real foreign key so that deleting a subtree out of order is rejected by SQLite
/// rather than silently leaving dangling rows.
pub(crate) fn ensure_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS settings (
            name  TEXT PRIMARY KEY,
            type  INTEGER NOT NULL,
            value BLOB
         );
         CREATE TABLE IF NOT EXISTS entries (
            id       INTEGER PRIMARY KEY,
            parent   INTEGER NOT NULL REFERENCES entries(id),
            revision INTEGER NOT NULL,
            name     TEXT NOT NULL,
            type     INTEGER NOT NULL,
            value    BLOB
         );
         CREATE INDEX IF NOT EXISTS idx_entries_name ON entries(name);
         CREATE INDEX IF NOT EXISTS idx_entries_parent ON entries(parent);
         CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_parent_name ON entries(parent, name);",
    )?;
    Ok(())
}

pub(crate) fn ensure_root(conn: &Connection) -> Result<(), Error> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO entries (id, parent, revision, name, type, value)
         VALUES (?1, ?1, 0, '', 1, 0)",
        [ROOT_ID],
    )?;
    if inserted > 0 {
        debug!("created root entry");
    }
    Ok(())
}

pub(crate) fn integrity_check(conn: &Connection) -> Result<Vec<String>, Error> {
    let mut stmt = conn.prepare_cached("PRAGMA integrity_check")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn foreign_key_check(conn: &Connection) -> Result<Vec<String>, Error> {
    let mut stmt = conn.prepare_cached("PRAGMA foreign_key_check")?;
    let rows = stmt.query_map([], |row| {
        let table: String = row.get(0)?;
        let rowid: Option<i64> = row.get(1)?;
        let parent_table: String = row.get(2)?;
        Ok(format!("{table} row {rowid:?} has a dangling reference into {parent_table}"))
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
