//! Persistence boundary for the cooking session.
//!
//! The session container writes its snapshot through a `SessionStore` after
//! every state change. Implementations hold exactly one record.

use std::sync::Mutex;

use crate::error::{Result, SousError};
use crate::types::SessionSnapshot;

/// A durable key-value sink holding one session record.
pub trait SessionStore: Send + Sync {
    /// Read the stored session, if any.
    fn load(&self) -> Result<Option<SessionSnapshot>>;

    /// Overwrite the stored session.
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;

    /// Remove the stored session.
    fn clear(&self) -> Result<()>;
}

/// In-process store, used in tests and when no database is configured.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: Mutex<Option<SessionSnapshot>>,
    fail_writes: bool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail. Reads still succeed.
    pub fn failing() -> Self {
        Self {
            record: Mutex::new(None),
            fail_writes: true,
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionSnapshot>> {
        let guard = self
            .record
            .lock()
            .map_err(|e| SousError::Storage(format!("Store lock poisoned: {}", e)))?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        if self.fail_writes {
            return Err(SousError::Storage("write rejected".to_string()));
        }
        let mut guard = self
            .record
            .lock()
            .map_err(|e| SousError::Storage(format!("Store lock poisoned: {}", e)))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.fail_writes {
            return Err(SousError::Storage("write rejected".to_string()));
        }
        let mut guard = self
            .record
            .lock()
            .map_err(|e| SousError::Storage(format!("Store lock poisoned: {}", e)))?;
        *guard = None;
        Ok(())
    }
}
