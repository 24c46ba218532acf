//! Client-local key/value storage
//!
//! The browser kept the cart, the remembered login e-mail and the last
//! access time in `localStorage`. [`FileStorage`] keeps the same keys in one
//! JSON file under the work dir; [`MemoryStorage`] is for tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub const KEY_CART: &str = "carrinho";
pub const KEY_SAVED_EMAIL: &str = "savedEmail";
pub const KEY_LAST_ACCESS: &str = "lastAccess";

const STORAGE_FILE: &str = "local_storage.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<StorageError> for shared::error::AppError {
    fn from(err: StorageError) -> Self {
        shared::error::AppError::storage(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

/// Typed helpers over [`LocalStorage`]
pub trait LocalStorageExt: LocalStorage {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get_item(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, &raw)
    }
}

impl<S: LocalStorage + ?Sized> LocalStorageExt for S {}

// =============================================================================
// File-backed storage
// =============================================================================

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens (or starts) `local_storage.json` inside `dir`.
    /// An unreadable file is logged and treated as empty.
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(STORAGE_FILE);

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Local storage file is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes to a temp file first so a crash never leaves half a file
    fn flush(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

// =============================================================================
// In-memory storage
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let storage = FileStorage::open(dir.path()).unwrap();
        storage.set_item(KEY_SAVED_EMAIL, "admin@restaurante.com").unwrap();
        storage.set_json(KEY_CART, &vec![1, 2, 3]).unwrap();
        drop(storage);

        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get_item(KEY_SAVED_EMAIL).unwrap().as_deref(),
            Some("admin@restaurante.com")
        );
        let cart: Option<Vec<i32>> = reopened.get_json(KEY_CART).unwrap();
        assert_eq!(cart, Some(vec![1, 2, 3]));

        reopened.remove_item(KEY_SAVED_EMAIL).unwrap();
        assert!(reopened.get_item(KEY_SAVED_EMAIL).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORAGE_FILE), "{not json").unwrap();

        let storage = FileStorage::open(dir.path()).unwrap();
        assert!(storage.get_item(KEY_CART).unwrap().is_none());
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.get_item(KEY_LAST_ACCESS).unwrap().is_none());
        storage.set_item(KEY_LAST_ACCESS, "2024-06-01T10:00:00Z").unwrap();
        assert!(storage.get_item(KEY_LAST_ACCESS).unwrap().is_some());
    }
}
