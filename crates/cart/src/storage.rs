//! On-device key-value storage.
//!
//! Mirrors the browser `localStorage` contract: string keys, string values,
//! whole-value overwrites. The cart keeps a single JSON snapshot under
//! [`CART_STORAGE_KEY`].

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Storage key for the persisted cart snapshot.
pub const CART_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Errors that can occur reading or writing local storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` if the key has never been written.
    fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Overwrite a value.
    fn set_item(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete a value. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

// =============================================================================
// FileStore
// =============================================================================

/// Directory-backed storage, one file per key.
///
/// Writes go to a temporary sibling that is flushed to disk and then renamed
/// into place, so a reader never sees a half-written value.
///
/// Keys are percent-encoded into file names; distinct keys never share a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path holding `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), bytes = value.len(), "Wrote storage item");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Map a storage key to a file stem (`@RocketShoes:cart` -> `%40RocketShoes%3Acart`).
///
/// Percent-encoding escapes `%` and `/`, so the mapping is one-to-one and the
/// stem never leaves the storage directory.
fn file_stem(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-process storage for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key, e.g. to simulate a snapshot left by a previous run.
    #[must_use]
    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.lock().insert(key.to_string(), value.to_string());
        self
    }

    /// Current value of `key`, without going through the async API.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.peek(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(CART_STORAGE_KEY), "%40RocketShoes%3Acart");
        assert_eq!(file_stem("../etc/passwd"), "..%2Fetc%2Fpasswd");
        assert_ne!(file_stem(CART_STORAGE_KEY), file_stem("_RocketShoes_cart"));
        assert_ne!(file_stem("a b"), file_stem("a%20b"));
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get_item(CART_STORAGE_KEY).await.unwrap(), None);

        store.set_item(CART_STORAGE_KEY, "[1]").await.unwrap();
        store.set_item(CART_STORAGE_KEY, "[2]").await.unwrap();
        assert_eq!(
            store.get_item(CART_STORAGE_KEY).await.unwrap().as_deref(),
            Some("[2]")
        );
        assert_eq!(
            std::fs::read_to_string(store.path_for(CART_STORAGE_KEY)).unwrap(),
            "[2]"
        );
        assert!(!store.path_for(CART_STORAGE_KEY).with_extension("json.tmp").exists());

        store.remove_item(CART_STORAGE_KEY).await.unwrap();
        store.remove_item(CART_STORAGE_KEY).await.unwrap();
        assert_eq!(store.get_item(CART_STORAGE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.set_item("a", "1").await.unwrap();
        store.set_item("b", "2").await.unwrap();
        assert_eq!(store.get_item("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.get_item("b").await.unwrap().as_deref(), Some("2"));

        store.set_item(CART_STORAGE_KEY, "[1]").await.unwrap();
        store.set_item("_RocketShoes_cart", "[2]").await.unwrap();
        assert_eq!(
            store.get_item(CART_STORAGE_KEY).await.unwrap().as_deref(),
            Some("[1]")
        );
        assert_eq!(
            store.get_item("_RocketShoes_cart").await.unwrap().as_deref(),
            Some("[2]")
        );
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new().with_item("k", "v");
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("v"));

        store.set_item("k", "w").await.unwrap();
        assert_eq!(store.peek("k").as_deref(), Some("w"));

        store.remove_item("k").await.unwrap();
        assert_eq!(store.peek("k"), None);
    }
}
