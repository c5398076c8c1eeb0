//! Database connection management.
//!
//! A single rusqlite `Connection` behind a `Mutex`. WAL mode and the schema
//! are set up when the database is opened.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use sous_core::error::SousError;

use crate::migrations;

/// The session database.
///
/// The tick loop and the voice loop both save through the same store, and
/// a rusqlite `Connection` is not `Sync`, so it sits behind a `Mutex`.
/// There is a single session record; contention is one short upsert.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn new(path: &Path) -> Result<Self, SousError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| SousError::Storage(format!("Failed to open database: {}", e)))?;
        let db = Self::configure(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, SousError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SousError::Storage(format!("Failed to open in-memory db: {}", e)))?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self, SousError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| SousError::Storage(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, SousError>
    where
        F: FnOnce(&Connection) -> Result<T, SousError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SousError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
