//! Read-only SQLite store handles
//!
//! A `Storage` names one database file. The connection is opened on first
//! use, held for the life of the handle, and released by `close` (or on
//! drop). Nothing here ever writes: connections are opened read-only and
//! pinned with `query_only`.

use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

use crate::contacts::normalize_phone;
use crate::error::{ImsgError, Result};

/// Name of the SQL scalar function that canonicalizes phone numbers
pub const NORMALIZE_PHONE_FN: &str = "imsg_normalize_phone";

/// A lazily-opened, read-only handle on one SQLite store
pub struct Storage {
    label: String,
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl Storage {
    /// Create a handle without touching the file
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            conn: Mutex::new(None),
        }
    }

    /// Wrap an already open connection (in-memory fixtures, tests)
    pub fn from_connection(label: impl Into<String>, conn: Connection) -> Result<Self> {
        register_functions(&conn)?;
        Ok(Self {
            label: label.into(),
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Open the underlying file read-only and check that it is a readable database
    fn create_connection(&self) -> Result<Connection> {
        if !self.path.exists() {
            return Err(self.unavailable("file not found"));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags)
            .map_err(|e| self.unavailable(e.to_string()))?;

        // Opening is lazy inside SQLite too; the first real read is what
        // surfaces permission and format problems.
        conn.execute_batch(
            r#"
            PRAGMA query_only=ON;
            PRAGMA busy_timeout=5000;
            "#,
        )
        .and_then(|_| conn.query_row("SELECT count(*) FROM sqlite_master", [], |_| Ok(())))
        .map_err(|e| self.unavailable(e.to_string()))?;

        register_functions(&conn)?;

        tracing::info!(store = %self.label, path = %self.path.display(), "Opened store");
        Ok(conn)
    }

    fn unavailable(&self, reason: impl Into<String>) -> ImsgError {
        ImsgError::StoreUnavailable {
            store: self.label.clone(),
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Execute a function with the connection, opening it on first use
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            *guard = Some(self.create_connection()?);
        }
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(self.unavailable("connection not open")),
        }
    }

    /// Execute a function inside one read transaction, so every query it
    /// runs sees the same snapshot of the store
    pub fn with_snapshot<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            *guard = Some(self.create_connection()?);
        }
        let conn = match guard.as_mut() {
            Some(conn) => conn,
            None => return Err(self.unavailable("connection not open")),
        };
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Open the store now and run a trivial read, without keeping any result
    pub fn probe(&self) -> Result<()> {
        self.with_connection(|_| Ok(()))
    }

    /// Release the connection; a later call reopens it
    pub fn close(&self) -> Result<()> {
        if let Some(conn) = self.conn.lock().take() {
            conn.close().map_err(|(_, e)| ImsgError::Database(e))?;
            tracing::info!(store = %self.label, "Closed store");
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.conn.lock().is_some()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("label", &self.label)
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        NORMALIZE_PHONE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let raw: Option<String> = ctx.get(0)?;
            Ok(raw.map(|r| normalize_phone(&r)))
        },
    )?;
    Ok(())
}
