//! The dynamically-typed value stored at each entry, and its on-disk type tag.

use crate::error::{Error, InconsistentDataError};

/// The three value shapes an entry can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueType {
    Integer = 1,
    Text = 2,
    Blob = 3,
}

impl ValueType {
    pub(crate) fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            1 => Some(ValueType::Integer),
            2 => Some(ValueType::Text),
            3 => Some(ValueType::Blob),
            _ => None,
        }
    }

    pub(crate) fn tag(self) -> i64 {
        self as i64
    }
}

/// A value held by an entry. Intermediate entries auto-vivified during `Create`/`SetOrCreate`
/// are given `Value::Integer(0)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Text(_) => ValueType::Text,
            Value::Blob(_) => ValueType::Blob,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

pub(crate) fn type_tag(value: &Value) -> i64 {
    value.value_type().tag()
}

/// An empty blob is stored as `NULL` rather than a zero-length `BLOB` literal, since SQLite
/// treats the two identically on read but `NULL` avoids a spurious allocation on write.
pub(crate) fn to_sql_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Integer(i) => rusqlite::types::Value::Integer(*i),
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Blob(b) if b.is_empty() => rusqlite::types::Value::Null,
        Value::Blob(b) => rusqlite::types::Value::Blob(b.clone()),
    }
}

pub(crate) fn decode_value(id: i64, tag: i64, raw: rusqlite::types::Value) -> Result<Value, Error> {
    use rusqlite::types::Value as SqlValue;

    let value_type =
        ValueType::from_tag(tag).ok_or(InconsistentDataError::UnknownEntryType { id, tag })?;
    let value = match (value_type, raw) {
        (ValueType::Integer, SqlValue::Integer(i)) => Value::Integer(i),
        (ValueType::Text, SqlValue::Text(s)) => Value::Text(s),
        (ValueType::Blob, SqlValue::Blob(b)) => Value::Blob(b),
        (ValueType::Blob, SqlValue::Null) => Value::Blob(Vec::new()),
        // The type tag and the stored column affinity disagree; the row didn't come from us.
        (_, _) => return Err(InconsistentDataError::UnknownEntryType { id, tag }.into()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_sql_value() {
        for value in [
            Value::Integer(-7),
            Value::Text("hello".into()),
            Value::Blob(vec![1, 2, 3]),
            Value::Blob(Vec::new()),
        ] {
            let tag = type_tag(&value);
            let sql = to_sql_value(&value);
            let decoded = decode_value(1, tag, sql).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = decode_value(9, 42, rusqlite::types::Value::Null).unwrap_err();
        assert!(err.as_inconsistent().is_some());
    }
}
