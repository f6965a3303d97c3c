//! Row-level operations on the `entries` table. Everything here operates on a single id or a
//! single parent; path resolution and revision propagation live in `tree`.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{DatabaseError, Error};
use crate::value::{decode_value, to_sql_value, type_tag, Value};

pub(crate) struct EntryRow {
    pub(crate) revision: i64,
    pub(crate) value: Value,
}

pub(crate) fn find_child(conn: &Connection, parent: i64, name: &str) -> Result<Option<i64>, Error> {
    conn.prepare_cached("SELECT id FROM entries WHERE parent = ?1 AND name = ?2")?
        .query_row(rusqlite::params![parent, name], |row| row.get(0))
        .optional()
        .map_err(Error::from)
}

pub(crate) fn fetch(conn: &Connection, id: i64) -> Result<Option<EntryRow>, Error> {
    conn.prepare_cached("SELECT revision, type, value FROM entries WHERE id = ?1")?
        .query_row([id], |row| {
            let revision: i64 = row.get(0)?;
            let tag: i64 = row.get(1)?;
            let raw: rusqlite::types::Value = row.get(2)?;
            Ok((revision, tag, raw))
        })
        .optional()?
        .map(|(revision, tag, raw)| {
            let value = decode_value(id, tag, raw)?;
            Ok(EntryRow { revision, value })
        })
        .transpose()
}

pub(crate) fn insert(
    conn: &Connection,
    parent: i64,
    name: &str,
    value: &Value,
    revision: i64,
) -> Result<i64, Error> {
    conn.prepare_cached("INSERT INTO entries (parent, revision, name, type, value) VALUES (?1, ?2, ?3, ?4, ?5)")?
        .execute(rusqlite::params![parent, revision, name, type_tag(value), to_sql_value(value)])
        .map_err(DatabaseError::InvalidInsert)?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn update_value(conn: &Connection, id: i64, value: &Value, revision: i64) -> Result<(), Error> {
    conn.prepare_cached("UPDATE entries SET type = ?1, value = ?2, revision = ?3 WHERE id = ?4")?
        .execute(rusqlite::params![type_tag(value), to_sql_value(value), revision, id])
        .map_err(DatabaseError::InvalidQuery)?;
    Ok(())
}

pub(crate) fn bump_revision(conn: &Connection, id: i64) -> Result<(), Error> {
    conn.prepare_cached("UPDATE entries SET revision = revision + 1 WHERE id = ?1")?
        .execute([id])?;
    Ok(())
}

pub(crate) fn children_of(conn: &Connection, parent: i64) -> Result<Vec<(i64, String)>, Error> {
    let mut stmt = conn.prepare_cached("SELECT id, name FROM entries WHERE parent = ?1 AND id <> parent ORDER BY id")?;
    let rows = stmt.query_map([parent], |row| Ok((row.get(0)?, row.get(1)?)))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn has_child(conn: &Connection, parent: i64) -> Result<bool, Error> {
    let count: i64 = conn
        .prepare_cached("SELECT EXISTS(SELECT 1 FROM entries WHERE parent = ?1 AND id <> parent)")?
        .query_row([parent], |row| row.get(0))?;
    Ok(count != 0)
}

pub(crate) fn delete(conn: &Connection, id: i64) -> Result<(), Error> {
    conn.prepare_cached("DELETE FROM entries WHERE id = ?1")?
        .execute([id])?;
    Ok(())
}
