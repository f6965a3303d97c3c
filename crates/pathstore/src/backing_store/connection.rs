//! Connection setup: the pragmas and flags every store opens with.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::Error;

pub(crate) const CURRENT_MAJOR_VERSION: i64 = 1;
pub(crate) const CURRENT_MINOR_VERSION: i64 = 0;

const BUSY_TIMEOUT: Duration = Duration::from_secs(15);

/// Opens the backing database file, creating it only if `create` is set, and applies the
/// pragmas the rest of the crate assumes are in effect.
pub(crate) fn open(path: &Path, create: bool) -> Result<Connection, Error> {
    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    if create {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }
    let conn = Connection::open_with_flags(path, flags)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_pragmas(&conn)?;
    debug!(path = %path.display(), create, "opened backing store");
    Ok(conn)
}

fn apply_pragmas(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(
        "PRAGMA encoding = 'UTF-8';
         PRAGMA auto_vacuum = FULL;
         PRAGMA synchronous = FULL;
         PRAGMA foreign_keys = TRUE;
         PRAGMA journal_mode = DELETE;
         PRAGMA locking_mode = NORMAL;
         PRAGMA recursive_triggers = TRUE;
         PRAGMA secure_delete = TRUE;",
    )?;
    Ok(())
}
