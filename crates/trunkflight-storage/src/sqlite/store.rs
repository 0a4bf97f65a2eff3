//! [`SqliteStore`] -- SQLite-backed catalog implementation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::sqlite::schema;

/// SQLite-backed implementation of the [`Catalog`](crate::traits::Catalog) trait.
///
/// Wraps a [`rusqlite::Connection`] in a `Mutex` for thread safety. One
/// store is opened per process; all public methods acquire the lock,
/// execute SQL, and release it.
pub struct SqliteStore {
    /// The mutex-protected SQLite connection.
    pub(crate) conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a catalog database at the given path.
    ///
    /// Enables WAL mode and foreign keys, then ensures the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(?path, "opening catalog database");

        let conn = Connection::open(path).map_err(|e| {
            StorageError::Connection(format!("failed to open {}: {e}", path.display()))
        })?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.configure_connection()?;
        store.ensure_schema()?;

        Ok(store)
    }

    /// Opens an in-memory catalog (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        debug!("opening in-memory catalog database");
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("failed to open in-memory db: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.configure_connection()?;
        store.ensure_schema()?;

        Ok(store)
    }

    /// Sets connection pragmas (WAL mode, foreign keys, busy timeout).
    fn configure_connection(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| StorageError::Connection(format!("failed to set pragmas: {e}")))?;

        Ok(())
    }

    /// Creates all tables and indexes that do not exist and records the
    /// schema version. Safe to call any number of times; a catalog missing
    /// a table or index is repaired.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        for stmt in schema::SCHEMA_STATEMENTS {
            conn.execute_batch(stmt).map_err(|e| StorageError::Migration {
                name: "ensure_schema".into(),
                reason: format!("{e}\nStatement: {}", truncate(stmt.trim(), 120)),
            })?;
        }

        let version = user_version(&conn)?;
        if version >= schema::CURRENT_SCHEMA_VERSION {
            debug!(version, "schema already at current version");
            return Ok(());
        }

        conn.pragma_update(None, "user_version", schema::CURRENT_SCHEMA_VERSION)
            .map_err(|e| StorageError::Migration {
                name: "user_version".into(),
                reason: e.to_string(),
            })?;

        info!(from = version, to = schema::CURRENT_SCHEMA_VERSION, "catalog schema versioned");
        Ok(())
    }

    /// Acquires the connection lock. Helper used by all operation modules.
    pub(crate) fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Connection(format!("mutex poisoned: {e}")))
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

fn user_version(conn: &Connection) -> Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| StorageError::Migration {
            name: "user_version".into(),
            reason: e.to_string(),
        })
}

/// Truncates a string for error messages.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
