//! Single-use snapshot of an in-flight session.
//!
//! A snapshot is written when the app is backgrounded with a session in
//! progress and read back once at the next start. Reading consumes it: the key
//! is removed before the snapshot is handed to the session, so a crash after a
//! restore can never bring the same state back twice.

mod file_store;

use std::{collections::HashMap, sync::Mutex};

use crate::{error::PersistenceError, models::SessionSnapshot, session::SessionContext};

pub use file_store::FileRecoveryStorage;

pub const SNAPSHOT_KEY: &str = "jogga.session-snapshot";

/// Minimal key-value contract the snapshot is kept in.
pub trait RecoveryStorage: Send {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Process-local storage; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryRecoveryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryRecoveryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl RecoveryStorage for MemoryRecoveryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries().remove(key);
        Ok(())
    }
}

pub struct RecoveryManager {
    storage: Box<dyn RecoveryStorage>,
}

impl RecoveryManager {
    pub fn new(storage: Box<dyn RecoveryStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryRecoveryStorage::new()))
    }

    /// Writes the session, closing its open segment first. Returns `false`
    /// when there is no active session to save.
    pub fn save_snapshot(&self, session: &mut SessionContext) -> Result<bool, PersistenceError> {
        let Some(snapshot) = session.snapshot() else {
            return Ok(false);
        };

        let serialized = serde_json::to_string(&snapshot)?;
        self.storage.set(SNAPSHOT_KEY, &serialized)?;
        session.mark_saved();
        Ok(true)
    }

    /// Reads and deletes the snapshot. An unreadable snapshot is deleted too.
    pub fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, PersistenceError> {
        let Some(raw) = self.storage.get(SNAPSHOT_KEY)? else {
            return Ok(None);
        };

        let parsed = serde_json::from_str::<SessionSnapshot>(&raw);
        self.storage.remove(SNAPSHOT_KEY)?;
        Ok(Some(parsed?))
    }

    pub fn clear_snapshot(&self) -> Result<(), PersistenceError> {
        self.storage.remove(SNAPSHOT_KEY)
    }

    pub fn has_snapshot(&self) -> Result<bool, PersistenceError> {
        Ok(self.storage.get(SNAPSHOT_KEY)?.is_some())
    }
}
