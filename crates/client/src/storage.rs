//! Persisted key/value storage for client state.
//!
//! Cart, wishlist and the auth token each live under a fixed key as a
//! string (JSON for the lists). [`FileStore`] keeps one file per key in the
//! client data directory; [`MemoryStore`] is the in-process equivalent.
//!
//! Writers are last-writer-wins: two processes sharing a data directory do
//! not coordinate beyond the atomic rename of each file.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

/// Storage key for the cart entries.
pub const CART_KEY: &str = "cart";
/// Storage key for the wishlist ids.
pub const WISHLIST_KEY: &str = "wishlist";
/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the signed-in email.
pub const USER_EMAIL_KEY: &str = "userEmail";

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Key contains characters that cannot be used as a file name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Backend refused the write (e.g. quota).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A string key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a key. `Ok(None)` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Directory holding the files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get(CART_KEY).unwrap(), None);
        store.set(CART_KEY, "[]").unwrap();
        assert_eq!(store.get(CART_KEY).unwrap().as_deref(), Some("[]"));

        store.remove(CART_KEY).unwrap();
        assert_eq!(store.get(CART_KEY).unwrap(), None);
        // Removing twice is fine
        store.remove(CART_KEY).unwrap();
    }

    #[test]
    fn test_file_store_creates_nested_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();
        store.set(TOKEN_KEY, "t").unwrap();
        assert!(nested.join("token.json").exists());
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_two_file_stores_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let a = FileStore::open(dir.path()).unwrap();
        let b = FileStore::open(dir.path()).unwrap();
        a.set(WISHLIST_KEY, r#"["p1"]"#).unwrap();
        assert_eq!(b.get(WISHLIST_KEY).unwrap().as_deref(), Some(r#"["p1"]"#));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set(USER_EMAIL_KEY, "a@b.co").unwrap();
        assert_eq!(store.get(USER_EMAIL_KEY).unwrap().as_deref(), Some("a@b.co"));
        store.remove(USER_EMAIL_KEY).unwrap();
        assert!(store.get(USER_EMAIL_KEY).unwrap().is_none());
    }
}
