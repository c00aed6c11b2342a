//! Durable key-value storage
//!
//! Client state (the persisted session) lives under a namespace key. The
//! [`KeyValueStore`] seam has a file-backed implementation for the binary and
//! an in-memory one for tests and ephemeral runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Storage error
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Namespaced string storage
#[trait_variant::make(KeyValueStore: Send)]
pub trait LocalKeyValueStore {
    /// Read a record; `None` if it was never written or has been removed
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a record, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a record; removing a missing record is not an error
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // records are replaced atomically
        let tmp = path.with_extension("json.tmp");
        match tokio::fs::remove_file(&tmp).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        let mut file = owner_only().open(&tmp).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Records hold credentials; on unix they are readable by the owner only
fn owner_only() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options
}

/// Process-local storage; clones share the same records
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw record, for assertions
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.snapshot(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileStore, KeyValueStore, MemoryStore, StorageError};

    #[tokio::test]
    async fn test_file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state"));

        assert_eq!(store.get("auth-storage").await.unwrap(), None);

        store.set("auth-storage", r#"{"state":{}}"#).await.unwrap();
        assert_eq!(
            store.get("auth-storage").await.unwrap().as_deref(),
            Some(r#"{"state":{}}"#)
        );
        assert!(dir.path().join("state/auth-storage.json").exists());
        assert!(!dir.path().join("state/auth-storage.json.tmp").exists());

        store.set("auth-storage", "{}").await.unwrap();
        assert_eq!(store.get("auth-storage").await.unwrap().as_deref(), Some("{}"));

        store.remove("auth-storage").await.unwrap();
        assert_eq!(store.get("auth-storage").await.unwrap(), None);
        store.remove("auth-storage").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_records_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("auth-storage", r#"{"state":{"token":"a1"}}"#).await.unwrap();
        store.set("auth-storage", r#"{"state":{"token":"a2"}}"#).await.unwrap();

        let mode = std::fs::metadata(dir.path().join("auth-storage.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(
                matches!(store.get(key).await, Err(StorageError::InvalidKey(_))),
                "{key:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_memory_store_shared_between_clones() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("k", "v").await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));

        other.remove("k").await.unwrap();
        assert_eq!(store.snapshot("k"), None);
    }
}
