//! The `Store`: the public handle wrapping a connection, its transaction registry, and the
//! current delimiter.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rusqlite::Connection;
use tracing::info;

use crate::backing_store;
use crate::consistency;
use crate::error::{ConfigurationError, Error};
use crate::transaction::{ReadTxn, TxRegistry, WriteTxn};
use crate::tree;
use crate::value::{Value, ValueType};

/// Options controlling how a [`Store`] is opened.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    path: PathBuf,
    create: bool,
    delimiter: char,
}

impl OpenOptions {
    /// Starts from sensible defaults: create the file if missing, delimiter `.`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create: true,
            delimiter: '.',
        }
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// The delimiter to use for a brand new store. Ignored if the store already has a
    /// persisted `NameDelimiter` setting.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// The id and revision counter of an entry (or the root, for `name == ""`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRevision {
    pub id: i64,
    pub revision: i64,
}

/// A persistent, hierarchical configuration store backed by a single SQLite file.
///
/// `Store` is intentionally `!Send` and `!Sync`: it holds an `Rc`-based transaction registry
/// with no cross-thread sharing story, matching its single-threaded-per-instance design.
pub struct Store {
    conn: Rc<RefCell<Connection>>,
    transactions: TxRegistry,
    delimiter: Cell<char>,
}

impl Store {
    /// Opens (and, if requested, creates) a store at the given path.
    pub fn open(options: OpenOptions) -> Result<Self, Error> {
        Self::open_path(&options.path, options.create, options.delimiter)
    }

    fn open_path(path: &Path, create: bool, requested_delimiter: char) -> Result<Self, Error> {
        if requested_delimiter == '\0' {
            return Err(ConfigurationError::InvalidConfiguration(
                "delimiter must not be the NUL character".to_string(),
            )
            .into());
        }
        let conn = backing_store::open(path, create)?;
        backing_store::ensure_schema(&conn)?;
        backing_store::ensure_root(&conn)?;
        let delimiter = backing_store::load_or_init_delimiter(&conn, requested_delimiter)?;
        info!(path = %path.display(), delimiter, "store ready");

        let conn = Rc::new(RefCell::new(conn));
        let transactions = TxRegistry::new(conn.clone());
        Ok(Self {
            conn,
            transactions,
            delimiter: Cell::new(delimiter),
        })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter.get()
    }

    /// Opens an explicit read scope. Joins whichever transaction (reader or writer) is already
    /// active, or opens a fresh deferred one. Every `Store` read method does this implicitly if
    /// no explicit scope is held by the caller.
    pub fn begin_read(&self) -> Result<ReadTxn, Error> {
        self.transactions.begin_read()
    }

    /// Opens an explicit write scope: a fresh immediate transaction if none is active, or a
    /// nested `SAVEPOINT` if a writer already is. Fails if a reader transaction is active.
    pub fn begin_write(&self) -> Result<WriteTxn, Error> {
        self.transactions.begin_write()
    }

    fn with_reader<T>(&self, f: impl FnOnce(&Connection) -> Result<T, Error>) -> Result<T, Error> {
        let txn = self.transactions.begin_read()?;
        f(&txn.connection())
    }

    fn with_writer<T>(&self, f: impl FnOnce(&Connection) -> Result<T, Error>) -> Result<T, Error> {
        let txn = self.transactions.begin_write()?;
        let result = f(&txn.connection())?;
        txn.commit()?;
        Ok(result)
    }

    pub fn exists(&self, name: &str) -> Result<bool, Error> {
        self.with_reader(|conn| tree::exists(conn, self.delimiter(), name))
    }

    pub fn get_type(&self, name: &str) -> Result<ValueType, Error> {
        self.with_reader(|conn| tree::get_type(conn, self.delimiter(), name))
    }

    pub fn is_integer(&self, name: &str) -> Result<bool, Error> {
        Ok(self.get_type(name)? == ValueType::Integer)
    }

    pub fn is_string(&self, name: &str) -> Result<bool, Error> {
        Ok(self.get_type(name)? == ValueType::Text)
    }

    pub fn is_binary(&self, name: &str) -> Result<bool, Error> {
        Ok(self.get_type(name)? == ValueType::Blob)
    }

    /// `""` denotes the root.
    pub fn get_revision(&self, name: &str) -> Result<EntryRevision, Error> {
        self.with_reader(|conn| {
            let (id, revision) = tree::get_revision(conn, self.delimiter(), name)?;
            Ok(EntryRevision { id, revision })
        })
    }

    /// `""` denotes the root.
    pub fn has_child(&self, name: &str) -> Result<bool, Error> {
        self.with_reader(|conn| tree::has_child(conn, self.delimiter(), name))
    }

    /// `""` denotes the root. Children come back in id (creation) order.
    pub fn get_children(&self, name: &str) -> Result<Vec<String>, Error> {
        self.with_reader(|conn| tree::get_children(conn, self.delimiter(), name))
    }

    pub fn get_integer(&self, name: &str) -> Result<i64, Error> {
        self.with_reader(|conn| tree::get_integer(conn, self.delimiter(), name))
    }

    pub fn get_string(&self, name: &str) -> Result<String, Error> {
        self.with_reader(|conn| tree::get_string(conn, self.delimiter(), name))
    }

    pub fn get_binary(&self, name: &str) -> Result<Vec<u8>, Error> {
        self.with_reader(|conn| tree::get_binary(conn, self.delimiter(), name))
    }

    /// Fails with `NameAlreadyExists` if the full name already resolves to an entry.
    /// Auto-vivifies any missing ancestor segments as empty integer entries.
    pub fn create(&self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        self.with_writer(|conn| tree::create(conn, self.delimiter(), name, value))
    }

    /// Fails with `EntryNotFound` if `name` does not already exist.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        self.with_writer(|conn| tree::set(conn, self.delimiter(), name, value))
    }

    /// Creates `name` (auto-vivifying ancestors) if absent, otherwise overwrites its value.
    pub fn set_or_create(&self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        self.with_writer(|conn| tree::set_or_create(conn, self.delimiter(), name, value))
    }

    /// Returns `false` instead of failing when `name` doesn't exist, or when it has children
    /// and `recursive` is false.
    pub fn try_delete(&self, name: &str, recursive: bool) -> Result<bool, Error> {
        self.with_writer(|conn| tree::try_delete(conn, self.delimiter(), name, recursive))
    }

    /// Fails with `EntryNotFound` if `name` doesn't exist, or `HasChildEntry` if it has children
    /// and `recursive` is false.
    pub fn delete(&self, name: &str, recursive: bool) -> Result<(), Error> {
        self.with_writer(|conn| tree::delete(conn, self.delimiter(), name, recursive))
    }

    /// Fails with `DatabaseError::InvalidDelimiter` if any existing entry name already contains
    /// `new_delimiter`.
    pub fn set_new_delimiter(&self, new_delimiter: char) -> Result<(), Error> {
        self.with_writer(|conn| {
            if !tree::is_valid_new_delimiter(conn, new_delimiter)? {
                return Err(crate::error::DatabaseError::InvalidDelimiter(new_delimiter).into());
            }
            backing_store::write_setting(
                conn,
                "NameDelimiter",
                &Value::Text(new_delimiter.to_string()),
            )
        })?;
        self.delimiter.set(new_delimiter);
        Ok(())
    }

    /// A read-only structural scan: uniqueness, reachability from the root, delimiter-free
    /// names, and recognized type tags. Does not check SQLite's own file-level integrity; see
    /// [`Store::check_backing_store_integrity`] for that.
    pub fn check_data_consistency(&self) -> Result<(), Error> {
        self.with_reader(|conn| consistency::check_data_consistency(conn, self.delimiter()))
    }

    /// Recovery of a damaged tree is out of scope for this crate: this is a stub that performs
    /// no repair and always returns `0`. Callers seeing [`Store::check_data_consistency`] fail
    /// need to intervene manually (or restore from a backup).
    pub fn repair_data_consistency(&self) -> Result<u64, Error> {
        self.with_writer(consistency::repair_data_consistency)
    }

    /// Runs SQLite's own `PRAGMA integrity_check` and `PRAGMA foreign_key_check`, returning any
    /// diagnostic lines they report. An empty result means SQLite considers the file sound.
    pub fn check_backing_store_integrity(&self) -> Result<Vec<String>, Error> {
        self.with_reader(|conn| {
            let mut diagnostics = backing_store::integrity_check(conn)?;
            diagnostics.retain(|line| line != "ok");
            diagnostics.extend(backing_store::foreign_key_check(conn)?);
            Ok(diagnostics)
        })
    }
}
