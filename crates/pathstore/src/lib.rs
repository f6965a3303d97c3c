//! A persistent, hierarchical configuration store backed by SQLite.
//!
//! Entries form a tree addressed by dotted names (`"a.b.c"`), each holding an integer, a
//! string, or a binary value. Every entry and the root carry a revision counter that bumps
//! whenever the entry or any of its descendants changes, so callers can cheaply tell whether a
//! subtree is unchanged without walking it.
//!
//! ```no_run
//! use pathstore::{OpenOptions, Store};
//!
//! # fn main() -> Result<(), pathstore::Error> {
//! let store = Store::open(OpenOptions::new("config.db"))?;
//! store.create("server.port", 8080i64)?;
//! assert_eq!(store.get_integer("server.port")?, 8080);
//! # Ok(())
//! # }
//! ```

mod backing_store;
mod consistency;
mod entry;
mod error;
mod path;
mod store;
mod transaction;
mod tree;
mod value;

pub use error::{ConfigurationError, DatabaseError, Error, InconsistentDataError, TransactionError};
pub use store::{EntryRevision, OpenOptions, Store};
pub use transaction::{ReadTxn, WriteTxn};
pub use value::{Value, ValueType};
