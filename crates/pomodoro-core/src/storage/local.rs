//! Local persistence of the session list.
//!
//! The whole collection is stored as one JSON string and rewritten on every
//! change. Unreadable data is reported as an empty collection so a corrupt
//! history never takes the app down.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;

use super::database::Database;
use super::record::SessionRecord;
use crate::error::StorageError;

pub(crate) const LOCAL_SESSIONS_KEY: &str = "local_sessions";

/// Always-available, synchronous local storage.
///
/// Besides the session collection it keeps a few small metadata entries
/// (the last signed-in owner, the remote outbox) next to it.
pub trait LocalStore: Send + Sync {
    /// Read every stored record. Absent or corrupt data yields an empty list.
    fn read_all(&self) -> Vec<SessionRecord>;

    /// Replace the stored collection.
    fn write_all(&self, records: &[SessionRecord]) -> Result<(), StorageError>;

    /// Read a metadata entry. Read failures are logged and yield `None`.
    fn read_meta(&self, key: &str) -> Option<String>;

    /// Write a metadata entry; `None` removes it.
    fn write_meta(&self, key: &str, value: Option<&str>) -> Result<(), StorageError>;
}

/// Decode a JSON payload, falling back to the default on any error.
pub fn decode_json_or_default<T>(raw: Option<&str>, what: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = raw else {
        return T::default();
    };
    match serde_json::from_str::<T>(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "{what} are unreadable; treating as empty");
            T::default()
        }
    }
}

/// Decode a serialized session collection, falling back to empty.
pub fn decode_sessions(raw: Option<&str>) -> Vec<SessionRecord> {
    decode_json_or_default(raw, "local sessions")
}

impl LocalStore for Database {
    fn read_all(&self) -> Vec<SessionRecord> {
        decode_sessions(self.read_meta(LOCAL_SESSIONS_KEY).as_deref())
    }

    fn write_all(&self, records: &[SessionRecord]) -> Result<(), StorageError> {
        let json = serde_json::to_string(records)?;
        self.kv_set(LOCAL_SESSIONS_KEY, &json)?;
        tracing::debug!(count = records.len(), "wrote local sessions");
        Ok(())
    }

    fn read_meta(&self, key: &str) -> Option<String> {
        self.kv_get(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "failed to read local entry");
            None
        })
    }

    fn write_meta(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        match value {
            Some(v) => self.kv_set(key, v),
            None => self.kv_delete(key),
        }
    }
}

/// In-process store holding serialized payloads, so it exercises the same
/// encode/decode path as the SQLite store.
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the raw serialized session payload.
    pub fn set_raw(&self, raw: &str) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.insert(LOCAL_SESSIONS_KEY.to_string(), raw.to_string());
        }
    }
}

impl LocalStore for MemoryLocalStore {
    fn read_all(&self) -> Vec<SessionRecord> {
        decode_sessions(self.read_meta(LOCAL_SESSIONS_KEY).as_deref())
    }

    fn write_all(&self, records: &[SessionRecord]) -> Result<(), StorageError> {
        let json = serde_json::to_string(records)?;
        self.write_meta(LOCAL_SESSIONS_KEY, Some(&json))
    }

    fn read_meta(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn write_meta(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        let mut guard = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        match value {
            Some(v) => guard.insert(key.to_string(), v.to_string()),
            None => guard.remove(key),
        };
        Ok(())
    }
}
