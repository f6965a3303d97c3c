//! Transaction and savepoint bookkeeping.
//!
//! A `Store` is single-threaded, so the teacher's `Arc`/`Mutex` handle-sharing pattern for a
//! live transaction becomes `Rc`/`Weak`/`RefCell` here: the registry keeps only a weak
//! reference to whichever transaction is currently open, and every `ReadTxn`/`WriteTxn` holds
//! the strong reference that keeps it alive. The last one dropped ends the real SQLite
//! transaction; everything in between is either a join (reads) or a nested `SAVEPOINT` (writes).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rusqlite::Connection;
use tracing::{debug, error, warn};

use crate::error::{Error, TransactionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Reader,
    Writer,
}

struct ActiveTx {
    mode: Mode,
}

pub(crate) struct TxRegistry {
    conn: Rc<RefCell<Connection>>,
    current: RefCell<Weak<RefCell<ActiveTx>>>,
    next_savepoint: Cell<u64>,
}

impl TxRegistry {
    pub(crate) fn new(conn: Rc<RefCell<Connection>>) -> Self {
        Self {
            conn,
            current: RefCell::new(Weak::new()),
            next_savepoint: Cell::new(0),
        }
    }

    fn active(&self) -> Option<Rc<RefCell<ActiveTx>>> {
        self.current.borrow().upgrade()
    }

    pub(crate) fn is_writer_active(&self) -> bool {
        matches!(self.active().map(|h| h.borrow().mode), Some(Mode::Writer))
    }

    /// Joins the active transaction if one exists (reader or writer), otherwise opens a fresh
    /// deferred (reader) transaction.
    pub(crate) fn begin_read(&self) -> Result<ReadTxn, Error> {
        if let Some(handle) = self.active() {
            return Ok(ReadTxn {
                conn: self.conn.clone(),
                handle,
            });
        }
        self.conn.borrow().execute_batch("BEGIN DEFERRED")?;
        let handle = Rc::new(RefCell::new(ActiveTx { mode: Mode::Reader }));
        *self.current.borrow_mut() = Rc::downgrade(&handle);
        debug!("opened deferred transaction");
        Ok(ReadTxn {
            conn: self.conn.clone(),
            handle,
        })
    }

    /// Opens a fresh immediate (writer) transaction if none is active, or nests a new named
    /// `SAVEPOINT` on top of the active writer. Fails if a reader transaction is active, since
    /// readers never promote to writers.
    pub(crate) fn begin_write(&self) -> Result<WriteTxn, Error> {
        match self.active() {
            None => {
                self.conn.borrow().execute_batch("BEGIN IMMEDIATE")?;
                let handle = Rc::new(RefCell::new(ActiveTx { mode: Mode::Writer }));
                *self.current.borrow_mut() = Rc::downgrade(&handle);
                debug!("opened immediate transaction");
                Ok(WriteTxn {
                    conn: self.conn.clone(),
                    handle,
                    savepoint: None,
                    committed: Cell::new(false),
                })
            }
            Some(handle) if handle.borrow().mode == Mode::Writer => {
                let name = format!("pathstore_sp_{}", self.next_savepoint.get());
                self.next_savepoint.set(self.next_savepoint.get() + 1);
                self.conn.borrow().execute_batch(&format!("SAVEPOINT {name}"))?;
                debug!(savepoint = %name, "opened nested savepoint");
                Ok(WriteTxn {
                    conn: self.conn.clone(),
                    handle,
                    savepoint: Some(name),
                    committed: Cell::new(false),
                })
            }
            Some(_) => Err(TransactionError::InvalidTransaction.into()),
        }
    }
}

/// A read scope. Ends (commits) the underlying transaction when the last reference to the
/// reader transaction it owns is dropped; does nothing if it was joined onto an active writer,
/// since the writer scope owns that transaction's lifetime.
pub struct ReadTxn {
    conn: Rc<RefCell<Connection>>,
    handle: Rc<RefCell<ActiveTx>>,
}

impl ReadTxn {
    pub(crate) fn connection(&self) -> std::cell::Ref<'_, Connection> {
        self.conn.borrow()
    }
}

impl Drop for ReadTxn {
    fn drop(&mut self) {
        let is_last_reader =
            self.handle.borrow().mode == Mode::Reader && Rc::strong_count(&self.handle) == 1;
        if is_last_reader {
            if let Err(e) = self.conn.borrow().execute_batch("COMMIT") {
                warn!(error = %e, "failed to end implicit reader transaction");
            }
        }
    }
}

/// A write scope. Must be explicitly committed with [`WriteTxn::commit`]; dropping it
/// uncommitted rolls it (or its savepoint) back.
pub struct WriteTxn {
    conn: Rc<RefCell<Connection>>,
    // Kept alive so the registry's weak handle stays valid for the scope's lifetime, and so
    // nested savepoints can tell they're nesting under a writer rather than a reader.
    handle: Rc<RefCell<ActiveTx>>,
    savepoint: Option<String>,
    committed: Cell<bool>,
}

impl WriteTxn {
    pub(crate) fn connection(&self) -> std::cell::Ref<'_, Connection> {
        self.conn.borrow()
    }

    pub fn commit(self) -> Result<(), Error> {
        let sql = match &self.savepoint {
            Some(name) => format!("RELEASE {name}"),
            None => "COMMIT".to_string(),
        };
        self.conn.borrow().execute_batch(&sql)?;
        self.committed.set(true);
        Ok(())
    }
}

impl Drop for WriteTxn {
    fn drop(&mut self) {
        if self.committed.get() {
            return;
        }
        let sql = match &self.savepoint {
            Some(name) => format!("ROLLBACK TO {name}; RELEASE {name}"),
            None => "ROLLBACK".to_string(),
        };
        match self.conn.borrow().execute_batch(&sql) {
            Ok(()) => warn!("writer transaction dropped without commit; rolled back"),
            Err(e) => {
                // The connection is now in an unknown state with an open transaction we could
                // not close; there is no safe way to keep serving requests against it.
                error!(error = %e, "failed to roll back an uncommitted writer transaction");
                std::process::abort();
            }
        }
    }
}
