//! The `settings` table: store-wide metadata that lives outside the entry tree.

use rusqlite::{Connection, OptionalExtension};

use super::connection::{CURRENT_MAJOR_VERSION, CURRENT_MINOR_VERSION};
use crate::error::{ConfigurationError, Error};
use crate::value::{decode_value, to_sql_value, type_tag, Value};

pub(crate) fn read_setting(conn: &Connection, name: &str) -> Result<Option<Value>, Error> {
    conn.query_row(
        "SELECT type, value FROM settings WHERE name = ?1",
        [name],
        |row| {
            let tag: i64 = row.get(0)?;
            let raw: rusqlite::types::Value = row.get(1)?;
            Ok((tag, raw))
        },
    )
    .optional()?
    .map(|(tag, raw)| decode_value(-1, tag, raw))
    .transpose()
}

pub(crate) fn write_setting(conn: &Connection, name: &str, value: &Value) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO settings (name, type, value) VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET type = excluded.type, value = excluded.value",
        rusqlite::params![name, type_tag(value), to_sql_value(value)],
    )?;
    Ok(())
}

/// Checks/initializes the version settings and resolves the delimiter to use for this session:
/// the persisted one if present, otherwise `requested_delimiter`, which is then persisted.
///
/// The reference implementation this crate's specification was distilled from checks the major
/// version twice on the open path; we check it once here, since the second check can never
/// observe a different value than the first within a single `open()` call.
pub(crate) fn load_or_init_delimiter(
    conn: &Connection,
    requested_delimiter: char,
) -> Result<char, Error> {
    match (read_setting(conn, "MajorVersion")?, read_setting(conn, "MinorVersion")?) {
        (None, None) => {
            write_setting(conn, "MajorVersion", &Value::Integer(CURRENT_MAJOR_VERSION))?;
            write_setting(conn, "MinorVersion", &Value::Integer(CURRENT_MINOR_VERSION))?;
        }
        (Some(Value::Integer(major)), Some(Value::Integer(_minor))) => {
            if major > CURRENT_MAJOR_VERSION {
                return Err(ConfigurationError::VersionNotSupported {
                    found: major,
                    current: CURRENT_MAJOR_VERSION,
                }
                .into());
            }
        }
        _ => {
            return Err(ConfigurationError::InvalidConfiguration(
                "version settings are present but malformed".to_string(),
            )
            .into())
        }
    }

    match read_setting(conn, "NameDelimiter")? {
        Some(Value::Text(s)) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(ConfigurationError::InvalidDelimiterSetting(s).into()),
            }
        }
        Some(_) => Err(ConfigurationError::InvalidDelimiterSetting(
            "NameDelimiter setting is not text".to_string(),
        )
        .into()),
        None => {
            write_setting(conn, "NameDelimiter", &Value::Text(requested_delimiter.to_string()))?;
            Ok(requested_delimiter)
        }
    }
}
