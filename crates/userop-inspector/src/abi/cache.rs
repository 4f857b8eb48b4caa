//! Durable ABI cache with a freshness window.
//!
//! Records are stored as JSON `{ "timestamp": <unix ms>, "abi": [...] }` under
//! the key `abi_<lowercase address>`. Nothing is evicted; a record older than
//! the TTL reads as stale and is overwritten by the next successful fetch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// How long a cached ABI stays valid
pub const ABI_CACHE_TTL: TimeDelta = TimeDelta::hours(24);

/// Errors reading or writing cache records
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache record is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Single-key string storage backing the ABI cache
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;
}

/// Distinguishes temp files of concurrent writes within one process
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`, created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Readers only ever see a complete record
        let path = self.path_for(key);
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}.{seq}.tmp", std::process::id()));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Serialized cache record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAbi {
    /// Unix timestamp in milliseconds at which the record was written
    pub timestamp: i64,
    /// Contract interface
    pub abi: JsonAbi,
}

/// Outcome of a cache read
#[derive(Debug)]
pub enum CacheLookup {
    /// Record younger than the TTL
    Fresh(JsonAbi),
    /// Record exists but has expired
    Stale,
    /// No record
    Missing,
}

/// Cache key for `address`
pub fn cache_key(address: &Address) -> String {
    format!("abi_{}", address.to_string().to_lowercase())
}

/// Typed ABI cache over a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct AbiCache {
    store: Arc<dyn KeyValueStore>,
    ttl: TimeDelta,
}

impl AbiCache {
    /// Cache over `store` with the default 24 hour TTL
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, ttl: ABI_CACHE_TTL }
    }

    /// Override the freshness window
    pub const fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    /// Read the record for `address` and classify its freshness
    pub async fn load(&self, address: &Address) -> Result<CacheLookup, CacheError> {
        let Some(raw) = self.store.get(&cache_key(address)).await? else {
            return Ok(CacheLookup::Missing);
        };

        let record: CachedAbi = serde_json::from_str(&raw)?;
        let age = Utc::now().timestamp_millis() - record.timestamp;
        if age < self.ttl.num_milliseconds() {
            Ok(CacheLookup::Fresh(record.abi))
        } else {
            Ok(CacheLookup::Stale)
        }
    }

    /// Write `abi` for `address`, stamped with the current time
    pub async fn store(&self, address: &Address, abi: &JsonAbi) -> Result<(), CacheError> {
        let record = CachedAbi { timestamp: Utc::now().timestamp_millis(), abi: abi.clone() };
        self.store.set(&cache_key(address), serde_json::to_string(&record)?).await
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use tempfile::TempDir;

    use super::*;
    use crate::contracts::IPaymasterV06;

    const ADDRESS: Address = address!("f5d253b62543C6Ef526309D497f619CeF95aD430");

    async fn write_record(store: &dyn KeyValueStore, timestamp: i64) {
        let record = CachedAbi { timestamp, abi: IPaymasterV06::abi::contract() };
        store.set(&cache_key(&ADDRESS), serde_json::to_string(&record).unwrap()).await.unwrap();
    }

    #[test]
    fn test_cache_key_is_lowercase() {
        assert_eq!(cache_key(&ADDRESS), "abi_0xf5d253b62543c6ef526309d497f619cef95ad430");
    }

    #[tokio::test]
    async fn test_store_then_load_is_fresh() {
        let cache = AbiCache::new(Arc::new(MemoryStore::new()));
        let abi = IPaymasterV06::abi::contract();
        cache.store(&ADDRESS, &abi).await.unwrap();

        match cache.load(&ADDRESS).await.unwrap() {
            CacheLookup::Fresh(loaded) => assert_eq!(loaded, abi),
            other => panic!("expected fresh record, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_file_writes_of_same_key() {
        let dir = TempDir::new().unwrap();
        let cache = AbiCache::new(Arc::new(FileStore::new(dir.path())));
        let abi = IPaymasterV06::abi::contract();

        for _ in 0..20 {
            let results =
                futures::future::join_all((0..8).map(|_| cache.store(&ADDRESS, &abi))).await;
            assert!(results.iter().all(Result::is_ok), "{results:?}");
        }

        assert!(matches!(cache.load(&ADDRESS).await.unwrap(), CacheLookup::Fresh(_)));
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1, "temp files left behind: {files:?}");
    }

    #[tokio::test]
    async fn test_old_record_is_stale() {
        let store = Arc::new(MemoryStore::new());
        let day_and_a_bit = (ABI_CACHE_TTL + TimeDelta::minutes(1)).num_milliseconds();
        write_record(store.as_ref(), Utc::now().timestamp_millis() - day_and_a_bit).await;

        let cache = AbiCache::new(store.clone());
        assert!(matches!(cache.load(&ADDRESS).await.unwrap(), CacheLookup::Stale));

        // Stale records are left in place
        assert!(store.get(&cache_key(&ADDRESS)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_record() {
        let cache = AbiCache::new(Arc::new(MemoryStore::new()));
        assert!(matches!(cache.load(&ADDRESS).await.unwrap(), CacheLookup::Missing));
    }

    #[tokio::test]
    async fn test_corrupt_record_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.set(&cache_key(&ADDRESS), "not json".to_string()).await.unwrap();

        let cache = AbiCache::new(store);
        assert!(matches!(cache.load(&ADDRESS).await, Err(CacheError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("abis"));
        assert!(store.get("abi_missing").await.unwrap().is_none());

        let cache = AbiCache::new(Arc::new(store.clone()));
        let abi = IPaymasterV06::abi::contract();
        cache.store(&ADDRESS, &abi).await.unwrap();

        let on_disk = store.dir().join(format!("{}.json", cache_key(&ADDRESS)));
        let record: CachedAbi =
            serde_json::from_str(&std::fs::read_to_string(on_disk).unwrap()).unwrap();
        assert_eq!(record.abi, abi);
        assert!(matches!(cache.load(&ADDRESS).await.unwrap(), CacheLookup::Fresh(_)));
    }
}
