//! The tagged error family surfaced to callers (see the error taxonomy in the design docs).

use enum_as_inner::EnumAsInner;
use thiserror::Error;

use crate::value::ValueType;

/// Top-level failure type for every fallible operation in this crate.
#[derive(Error, Debug, EnumAsInner)]
pub enum Error {
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("entry not found: {0:?}")]
    EntryNotFound(String),
    #[error("setting not found: {0}")]
    SettingNotFound(String),
    #[error("name already exists: {0:?}")]
    NameAlreadyExists(String),
    #[error("entry has child entries: {0:?}")]
    HasChildEntry(String),
    #[error("wrong value type for {name:?}: expected {expected:?}, found {found:?}")]
    WrongValueType {
        name: String,
        expected: ValueType,
        found: ValueType,
    },
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Inconsistent(#[from] InconsistentDataError),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Database(DatabaseError::Other(e))
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionError {
    #[error("a writer transaction was requested while a reader transaction is active")]
    InvalidTransaction,
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid delimiter setting: {0:?}")]
    InvalidDelimiterSetting(String),
    #[error("store major version {found} is not supported (current is {current})")]
    VersionNotSupported { found: i64, current: i64 },
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("invalid query: {0}")]
    InvalidQuery(#[source] rusqlite::Error),
    #[error("invalid insert: {0}")]
    InvalidInsert(#[source] rusqlite::Error),
    #[error("delimiter {0:?} cannot be used: it already appears in an existing entry name")]
    InvalidDelimiter(char),
    #[error(transparent)]
    Other(#[from] rusqlite::Error),
}

#[derive(Error, Debug, EnumAsInner)]
pub enum InconsistentDataError {
    #[error("root entry is missing")]
    RootEntryMissing,
    #[error("multiple root entries found")]
    MultipleRootEntries,
    #[error("root entry is invalid: {0}")]
    InvalidRootEntry(String),
    #[error("entry {id} has a name containing the delimiter: {name:?}")]
    InvalidEntryNameFound { id: i64, name: String },
    #[error("entry id {0} is not unique")]
    EntryIdNotUnique(i64),
    #[error("entry {0} is not reachable from the root")]
    AbandonedEntry(i64),
    #[error("entry {0} was reached more than once while walking the tree")]
    InvalidEntryLinking(i64),
    #[error("entry {id} has an unrecognized type tag {tag}")]
    UnknownEntryType { id: i64, tag: i64 },
}
