//! The adapter between the tree engine and the SQLite connection that actually stores it.

mod connection;
mod schema;
mod settings;

pub(crate) use connection::open;
pub(crate) use schema::{ensure_root, ensure_schema, foreign_key_check, integrity_check};
pub(crate) use settings::{load_or_init_delimiter, write_setting};
