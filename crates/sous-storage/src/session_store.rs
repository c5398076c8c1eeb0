//! `SessionStore` backed by the `session_state` table.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use sous_core::error::{Result, SousError};
use sous_core::store::SessionStore;
use sous_core::types::{SessionSnapshot, Timestamp};

use crate::db::Database;

/// Key the session record is stored under.
pub const SESSION_KEY: &str = "cooking-session";

#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    db: Arc<Database>,
}

impl SqliteSessionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The raw JSON currently stored, if any.
    pub fn raw(&self) -> Result<Option<String>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM session_state WHERE key = ?1",
                params![SESSION_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| SousError::Storage(format!("Failed to read session: {}", e)))
        })
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self) -> Result<Option<SessionSnapshot>> {
        match self.raw()? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO session_state (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![SESSION_KEY, json, Timestamp::now().0],
            )
            .map_err(|e| SousError::Storage(format!("Failed to save session: {}", e)))?;
            Ok(())
        })?;
        debug!(bytes = json.len(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM session_state WHERE key = ?1",
                params![SESSION_KEY],
            )
            .map_err(|e| SousError::Storage(format!("Failed to clear session: {}", e)))?;
            Ok(())
        })
    }
}
