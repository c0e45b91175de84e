//! Key-value persistence for per-player records
//!
//! Stands in for the browser's local storage: string keys, string values.
//! `RocksStore` survives restarts, `MemoryStore` lives as long as the process.

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::StorageError;
use rocksdb::{Options, DB};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

pub type StorageResult<T> = Result<T, StorageError>;

/// Minimal string store shared by the ledger, the claim gate and the simulated token
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn put(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Deleting a missing key is not an error
    fn delete(&self, key: &str) -> StorageResult<()>;
}

/// Open the store selected by the configuration
pub fn open_store(config: &StorageConfig) -> StorageResult<Arc<dyn KeyValueStore>> {
    match config.backend {
        StorageBackend::RocksDb => {
            tracing::debug!(path = %config.data_directory, "Opening RocksDB store");
            Ok(Arc::new(RocksStore::open(&config.data_directory)?))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

/// RocksDB-backed store
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path).map_err(|e| StorageError::OpenFailed(e.to_string()))?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl KeyValueStore for RocksStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let Some(bytes) = self
            .db
            .get(key.as_bytes())
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?
        else {
            return Ok(None);
        };

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StorageError::ReadFailed(format!("Non UTF-8 value under {}: {}", key, e)))
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        self.db.put(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.db.delete(key.as_bytes())?;
        Ok(())
    }
}

/// Process-local store; can be switched off to exercise degraded persistence
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StorageError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check_available()?;
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_available()?;
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.check_available()?;
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.put("pendingRewards_0xabc", "7").unwrap();
        assert_eq!(store.get("pendingRewards_0xabc").unwrap().as_deref(), Some("7"));

        store.delete("pendingRewards_0xabc").unwrap();
        assert_eq!(store.get("pendingRewards_0xabc").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_missing_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete("nothing").is_ok());
    }

    #[test]
    fn test_unavailable_store_fails() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.put("k", "v"), Err(StorageError::Unavailable)));
        assert!(matches!(store.get("k"), Err(StorageError::Unavailable)));

        store.set_unavailable(false);
        assert!(store.put("k", "v").is_ok());
    }

    #[test]
    fn test_rocks_store_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = RocksStore::open(dir.path()).unwrap();
            store.put("lastClaim_0xabc", "1700000000").unwrap();
        }
        let store = RocksStore::open(dir.path()).unwrap();
        assert_eq!(store.get("lastClaim_0xabc").unwrap().as_deref(), Some("1700000000"));
    }
}
