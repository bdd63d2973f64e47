//! SQLite connection management for the table backend.
//!
//! A single rusqlite Connection behind a Mutex. WAL mode is set on open and
//! the captures table is created if missing.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use snapvault_core::error::{Result, SnapvaultError};

use crate::migrations;

/// Thread-safe SQLite handle.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database file, creating parent directories.
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            SnapvaultError::StorageUnavailable(format!("Failed to open database: {}", e))
        })?;
        info!("Database opened at {}", path.display());

        Self::init(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            SnapvaultError::StorageUnavailable(format!("Failed to open in-memory db: {}", e))
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| SnapvaultError::StorageUnavailable(format!("Failed to set pragmas: {}", e)))?;

        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with the connection locked for its whole duration.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| {
            SnapvaultError::StorageUnavailable(format!("Database lock poisoned: {}", e))
        })?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
