//! The entry tree: path resolution, revision propagation, and the read/write operations the
//! `Store` exposes over it.

use rusqlite::Connection;
use tracing::debug;

use crate::entry;
use crate::error::Error;
use crate::path::{parse_name, path_to_name};
use crate::value::{Value, ValueType};

pub(crate) const ROOT_ID: i64 = 0;

pub(crate) fn random_revision() -> i64 {
    use rand::Rng;
    rand::rng().random::<i64>()
}

/// Walks from the root following `segments`, returning the ids matched along the way. The
/// chain is shorter than `segments` iff resolution stopped early; full success iff the lengths
/// are equal.
pub(crate) fn resolve_path(conn: &Connection, segments: &[&str]) -> Result<Vec<i64>, Error> {
    let mut chain = Vec::with_capacity(segments.len());
    let mut parent = ROOT_ID;
    for seg in segments {
        match entry::find_child(conn, parent, seg)? {
            Some(id) => {
                chain.push(id);
                parent = id;
            }
            None => break,
        }
    }
    Ok(chain)
}

fn resolve_required(conn: &Connection, delimiter: char, name: &str) -> Result<Vec<i64>, Error> {
    let segments = parse_name(name, delimiter)?;
    let chain = resolve_path(conn, &segments)?;
    if chain.len() == segments.len() {
        Ok(chain)
    } else {
        Err(Error::EntryNotFound(name.to_string()))
    }
}

fn resolve_required_or_root(conn: &Connection, delimiter: char, name: &str) -> Result<i64, Error> {
    if name.is_empty() {
        return Ok(ROOT_ID);
    }
    Ok(*resolve_required(conn, delimiter, name)?.last().unwrap())
}

fn bump_root_and_ancestors(conn: &Connection, ancestors: &[i64]) -> Result<(), Error> {
    entry::bump_revision(conn, ROOT_ID)?;
    for &id in ancestors {
        entry::bump_revision(conn, id)?;
    }
    Ok(())
}

fn fetch_required(conn: &Connection, id: i64, name: &str) -> Result<entry::EntryRow, Error> {
    entry::fetch(conn, id)?.ok_or_else(|| Error::EntryNotFound(name.to_string()))
}

pub(crate) fn exists(conn: &Connection, delimiter: char, name: &str) -> Result<bool, Error> {
    if name.is_empty() {
        return Ok(true);
    }
    let segments = parse_name(name, delimiter)?;
    Ok(resolve_path(conn, &segments)?.len() == segments.len())
}

pub(crate) fn get_type(conn: &Connection, delimiter: char, name: &str) -> Result<ValueType, Error> {
    let chain = resolve_required(conn, delimiter, name)?;
    let id = *chain.last().unwrap();
    Ok(fetch_required(conn, id, name)?.value.value_type())
}

pub(crate) fn get_revision(conn: &Connection, delimiter: char, name: &str) -> Result<(i64, i64), Error> {
    let id = resolve_required_or_root(conn, delimiter, name)?;
    let row = fetch_required(conn, id, name)?;
    Ok((id, row.revision))
}

pub(crate) fn has_child(conn: &Connection, delimiter: char, name: &str) -> Result<bool, Error> {
    let id = resolve_required_or_root(conn, delimiter, name)?;
    entry::has_child(conn, id)
}

pub(crate) fn get_children(conn: &Connection, delimiter: char, name: &str) -> Result<Vec<String>, Error> {
    let id = resolve_required_or_root(conn, delimiter, name)?;
    Ok(entry::children_of(conn, id)?.into_iter().map(|(_, n)| n).collect())
}

fn get_typed(conn: &Connection, delimiter: char, name: &str, expected: ValueType) -> Result<Value, Error> {
    let chain = resolve_required(conn, delimiter, name)?;
    let id = *chain.last().unwrap();
    let row = fetch_required(conn, id, name)?;
    if row.value.value_type() != expected {
        return Err(Error::WrongValueType {
            name: name.to_string(),
            expected,
            found: row.value.value_type(),
        });
    }
    Ok(row.value)
}

pub(crate) fn get_integer(conn: &Connection, delimiter: char, name: &str) -> Result<i64, Error> {
    match get_typed(conn, delimiter, name, ValueType::Integer)? {
        Value::Integer(i) => Ok(i),
        _ => unreachable!("get_typed enforces ValueType::Integer"),
    }
}

pub(crate) fn get_string(conn: &Connection, delimiter: char, name: &str) -> Result<String, Error> {
    match get_typed(conn, delimiter, name, ValueType::Text)? {
        Value::Text(s) => Ok(s),
        _ => unreachable!("get_typed enforces ValueType::Text"),
    }
}

pub(crate) fn get_binary(conn: &Connection, delimiter: char, name: &str) -> Result<Vec<u8>, Error> {
    match get_typed(conn, delimiter, name, ValueType::Blob)? {
        Value::Blob(b) => Ok(b),
        _ => unreachable!("get_typed enforces ValueType::Blob"),
    }
}

/// Inserts `value` at the end of `segments`, auto-vivifying any missing intermediate ancestors
/// as empty integer entries, then propagates revisions up the (pre-existing and newly created)
/// ancestor chain plus the root.
fn insert_with_autovivify(
    conn: &Connection,
    segments: &[&str],
    mut chain: Vec<i64>,
    value: Value,
    delimiter: char,
) -> Result<(), Error> {
    let mut parent = chain.last().copied().unwrap_or(ROOT_ID);
    let vivified = chain.len()..segments.len() - 1;
    if !vivified.is_empty() {
        debug!(
            path = %path_to_name(&segments[vivified.clone()], delimiter),
            "auto-vivifying intermediate ancestors"
        );
    }
    for seg in &segments[vivified] {
        let id = entry::insert(conn, parent, seg, &Value::Integer(0), random_revision())?;
        chain.push(id);
        parent = id;
    }
    entry::insert(conn, parent, segments[segments.len() - 1], &value, random_revision())?;
    bump_root_and_ancestors(conn, &chain)
}

pub(crate) fn create(conn: &Connection, delimiter: char, name: &str, value: Value) -> Result<(), Error> {
    let segments = parse_name(name, delimiter)?;
    let chain = resolve_path(conn, &segments)?;
    if chain.len() == segments.len() {
        return Err(Error::NameAlreadyExists(name.to_string()));
    }
    insert_with_autovivify(conn, &segments, chain, value, delimiter)
}

pub(crate) fn set(conn: &Connection, delimiter: char, name: &str, value: Value) -> Result<(), Error> {
    let chain = resolve_required(conn, delimiter, name)?;
    let id = *chain.last().unwrap();
    entry::update_value(conn, id, &value, random_revision())?;
    bump_root_and_ancestors(conn, &chain[..chain.len() - 1])
}

pub(crate) fn set_or_create(conn: &Connection, delimiter: char, name: &str, value: Value) -> Result<(), Error> {
    let segments = parse_name(name, delimiter)?;
    let chain = resolve_path(conn, &segments)?;
    if chain.len() == segments.len() {
        let id = *chain.last().unwrap();
        entry::update_value(conn, id, &value, random_revision())?;
        bump_root_and_ancestors(conn, &chain[..chain.len() - 1])
    } else {
        insert_with_autovivify(conn, &segments, chain, value, delimiter)
    }
}

/// Deletes `id` and, if `recursive`, every descendant. Traversal is iterative (an explicit work
/// list) rather than recursive, so a pathologically deep tree can't blow the call stack.
fn delete_subtree(conn: &Connection, id: i64, recursive: bool) -> Result<(), Error> {
    if !recursive {
        return entry::delete(conn, id);
    }
    let mut stack = vec![id];
    let mut order = Vec::new();
    while let Some(current) = stack.pop() {
        order.push(current);
        for (child_id, _) in entry::children_of(conn, current)? {
            stack.push(child_id);
        }
    }
    for entry_id in order.into_iter().rev() {
        entry::delete(conn, entry_id)?;
    }
    Ok(())
}

pub(crate) fn try_delete(conn: &Connection, delimiter: char, name: &str, recursive: bool) -> Result<bool, Error> {
    let segments = parse_name(name, delimiter)?;
    let chain = resolve_path(conn, &segments)?;
    if chain.len() != segments.len() {
        return Ok(false);
    }
    let id = *chain.last().unwrap();
    if !recursive && entry::has_child(conn, id)? {
        return Ok(false);
    }
    delete_subtree(conn, id, recursive)?;
    bump_root_and_ancestors(conn, &chain[..chain.len() - 1])?;
    Ok(true)
}

pub(crate) fn delete(conn: &Connection, delimiter: char, name: &str, recursive: bool) -> Result<(), Error> {
    let chain = resolve_required(conn, delimiter, name)?;
    let id = *chain.last().unwrap();
    if !recursive && entry::has_child(conn, id)? {
        return Err(Error::HasChildEntry(name.to_string()));
    }
    delete_subtree(conn, id, recursive)?;
    bump_root_and_ancestors(conn, &chain[..chain.len() - 1])
}

pub(crate) fn is_valid_new_delimiter(conn: &Connection, candidate: char) -> Result<bool, Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM entries WHERE id <> parent AND instr(name, ?1) > 0",
        [candidate.to_string()],
        |row| row.get(0),
    )?;
    Ok(count == 0)
}
