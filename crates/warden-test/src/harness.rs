//! Test harness helpers.

use std::sync::Arc;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use warden_storage::{FileKvStore, KvStore, MemoryKvStore, ScopedKvStore};

/// Create a temporary directory for testing.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn test_dir() -> TempDir {
    TempDir::with_prefix("warden-").expect("Failed to create temp directory")
}

/// Set up test logging with the given filter.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging with the default filter (warn level).
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

/// A scoped store over a fresh [`MemoryKvStore`].
///
/// # Panics
///
/// Panics if `namespace` is not a valid namespace.
#[must_use]
pub fn memory_store(namespace: &str) -> ScopedKvStore {
    scoped(Arc::new(MemoryKvStore::new()), namespace)
}

/// A scoped store over an existing backend.
///
/// # Panics
///
/// Panics if `namespace` is not a valid namespace.
#[must_use]
pub fn scoped(backend: Arc<dyn KvStore>, namespace: &str) -> ScopedKvStore {
    ScopedKvStore::new(backend, namespace).expect("Invalid test namespace")
}

/// A file-backed store rooted in a temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
///
/// # Panics
///
/// Panics if the directory or store cannot be created.
pub async fn file_store() -> (TempDir, Arc<FileKvStore>) {
    let dir = test_dir();
    let store = FileKvStore::open(dir.path())
        .await
        .expect("Failed to open file store");
    (dir, Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir() {
        let dir = test_dir();
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = memory_store("warden:test");
        store.set("k", b"v".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let (dir, store) = file_store().await;
        scoped(store, "warden:test")
            .set("k", b"v".to_vec())
            .await
            .unwrap();

        let reopened = FileKvStore::open(dir.path()).await.unwrap();
        let value = scoped(Arc::new(reopened), "warden:test").get("k").await.unwrap();
        assert_eq!(value, Some(b"v".to_vec()));
    }
}
