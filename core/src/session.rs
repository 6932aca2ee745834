//! Persisted client-side session state.
//!
//! The authentication blob lives under a single key (`auth-storage`) as
//! `{"state": {"token", "role", "userId", "refreshToken"}, "version": 0}`.
//! The request interceptor reads it before every request; `AuthStore`
//! writes it on every mutation.
//!
//! Two backends are provided: `MemoryStorage` for tests and short-lived
//! processes, and `FileStorage`, which keeps one JSON file per key under a
//! directory so a session survives restarts.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Role;

/// Storage key of the authentication blob.
pub const AUTH_STORAGE_KEY: &str = "auth-storage";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("stored value for {key} is malformed: {reason}")]
    Malformed { key: String, reason: String },

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Key/value storage for serialized client state.
///
/// Methods take `&self`; implementations synchronize internally so a single
/// storage can back an `ApiClient` shared across threads.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: SessionStorage + ?Sized> SessionStorage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<S: SessionStorage + ?Sized> SessionStorage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under `dir`.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(self.path_for(key), value).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Authentication fields persisted between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub is_authenticated: bool,
}

/// The envelope stored under `AUTH_STORAGE_KEY`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub state: SessionState,
    #[serde(default)]
    pub version: u32,
}

impl PersistedSession {
    pub fn new(state: SessionState) -> Self {
        Self { state, version: 0 }
    }

    /// Read the blob, `None` when nothing is stored.
    pub fn load(storage: &dyn SessionStorage) -> Result<Option<Self>, StorageError> {
        let Some(raw) = storage.get(AUTH_STORAGE_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Malformed {
                key: AUTH_STORAGE_KEY.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn save(&self, storage: &dyn SessionStorage) -> Result<(), StorageError> {
        let raw = serde_json::to_string(self).map_err(|e| StorageError::Malformed {
            key: AUTH_STORAGE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        storage.set(AUTH_STORAGE_KEY, &raw)
    }

    pub fn clear(storage: &dyn SessionStorage) -> Result<(), StorageError> {
        storage.remove(AUTH_STORAGE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::new(dir.path()).set(AUTH_STORAGE_KEY, "{}").unwrap();
        let reopened = FileStorage::new(dir.path());
        assert_eq!(reopened.get(AUTH_STORAGE_KEY).unwrap().as_deref(), Some("{}"));
        reopened.remove(AUTH_STORAGE_KEY).unwrap();
        reopened.remove(AUTH_STORAGE_KEY).unwrap();
        assert_eq!(reopened.get(AUTH_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn persisted_session_uses_camel_case_keys() {
        let session = PersistedSession::new(SessionState {
            token: Some("abc".to_string()),
            refresh_token: None,
            role: Some(Role::Editor),
            user_id: Some(9),
            is_authenticated: true,
        });
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["state"]["token"], "abc");
        assert_eq!(json["state"]["userId"], 9);
        assert_eq!(json["state"]["role"], "editor");
        assert_eq!(json["version"], 0);
    }

    #[test]
    fn persisted_session_load_save_clear() {
        let storage = MemoryStorage::new();
        assert_eq!(PersistedSession::load(&storage).unwrap(), None);

        let session = PersistedSession::new(SessionState {
            token: Some("abc".to_string()),
            is_authenticated: true,
            ..SessionState::default()
        });
        session.save(&storage).unwrap();
        assert_eq!(PersistedSession::load(&storage).unwrap(), Some(session));

        PersistedSession::clear(&storage).unwrap();
        assert_eq!(PersistedSession::load(&storage).unwrap(), None);
    }

    #[test]
    fn malformed_blob_is_reported() {
        let storage = MemoryStorage::new();
        storage.set(AUTH_STORAGE_KEY, "{oops").unwrap();
        assert!(matches!(
            PersistedSession::load(&storage),
            Err(StorageError::Malformed { .. })
        ));
    }

    #[test]
    fn shared_storage_delegates() {
        let shared = Arc::new(MemoryStorage::new());
        let boxed: Box<dyn SessionStorage> = Box::new(Arc::clone(&shared));
        boxed.set("k", "v").unwrap();
        assert_eq!(shared.get("k").unwrap().as_deref(), Some("v"));
    }
}
