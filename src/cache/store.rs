//! Cache store abstraction and the in-process memory store
//!
//! [`CacheStore`] is the contract the orchestrator consumes: string values
//! under string keys, with expiry enforced by the store. [`MemoryStore`] is a
//! bundled implementation with TTL expiry and LRU eviction, suitable for a
//! single process or for tests.

use crate::cache::{
    config::MemoryStoreConfig,
    entry::StoredEntry,
    types::{CacheKey, CacheValue},
};
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Key-value store holding encoded query results
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the value under `key`. `Ok(None)` when absent or expired.
    async fn get(&self, key: &str) -> std::result::Result<Option<CacheValue>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl_seconds`
    async fn set(
        &self,
        key: &str,
        value: CacheValue,
        ttl_seconds: u64,
    ) -> std::result::Result<(), CacheError>;

    /// Short backend name for diagnostics
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    async fn get(&self, key: &str) -> std::result::Result<Option<CacheValue>, CacheError> {
        (**self).get(key).await
    }

    async fn set(
        &self,
        key: &str,
        value: CacheValue,
        ttl_seconds: u64,
    ) -> std::result::Result<(), CacheError> {
        (**self).set(key, value, ttl_seconds).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Statistics for the memory store
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Reads that found a live entry
    pub hits: u64,

    /// Reads that found nothing (or an expired entry)
    pub misses: u64,

    /// Number of entries currently stored
    pub entries: usize,

    /// Total size of stored data in bytes
    pub size_bytes: usize,

    /// Number of evictions due to size limits
    pub evictions_size: u64,

    /// Number of evictions due to TTL expiration
    pub evictions_ttl: u64,
}

impl StoreStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate total evictions
    pub fn total_evictions(&self) -> u64 {
        self.evictions_size + self.evictions_ttl
    }
}

/// In-process cache store with TTL expiry and LRU eviction
///
/// - Thread-safe async access via RwLock
/// - Expiry checked on read and by [`MemoryStore::cleanup_expired`]
/// - LRU eviction when entry or byte limits are reached
pub struct MemoryStore {
    config: MemoryStoreConfig,
    inner: Arc<RwLock<StoreInner>>,
}

struct StoreInner {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, StoredEntry>,

    /// LRU tracking: front is evicted first
    lru_queue: VecDeque<CacheKey>,

    stats: StoreStats,

    current_size_bytes: usize,
}

impl MemoryStore {
    /// Create a store with the given configuration
    pub fn new(config: MemoryStoreConfig) -> Result<Self> {
        config.validate()?;
        info!("Initializing memory cache store with config: {:?}", config);

        let inner = StoreInner {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            stats: StoreStats::default(),
            current_size_bytes: 0,
        };

        Ok(Self {
            config,
            inner: Arc::new(RwLock::new(inner)),
        })
    }

    /// Store configuration
    pub fn config(&self) -> &MemoryStoreConfig {
        &self.config
    }

    /// Get store statistics
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;
        inner.stats.clone()
    }

    /// Get current size in bytes
    pub async fn size_bytes(&self) -> usize {
        let inner = self.inner.read().await;
        inner.current_size_bytes
    }

    /// Get number of stored entries (expired ones included until cleanup)
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.entries.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        let inner = self.inner.read().await;
        inner.entries.is_empty()
    }

    /// Check if a live entry exists (without updating access time)
    pub async fn contains_key(&self, key: &str) -> bool {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Remove all expired entries, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.write().await;

        let expired_keys: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            Self::remove_entry(&mut inner, key);
        }

        if !expired_keys.is_empty() {
            inner.stats.evictions_ttl += expired_keys.len() as u64;
            debug!("Cleaned up {} expired entries", expired_keys.len());
        }

        expired_keys.len()
    }

    fn remove_entry(inner: &mut StoreInner, key: &str) {
        if let Some(entry) = inner.entries.remove(key) {
            inner.lru_queue.retain(|k| k != key);
            inner.current_size_bytes = inner.current_size_bytes.saturating_sub(entry.size_bytes);
            inner.stats.entries = inner.entries.len();
            inner.stats.size_bytes = inner.current_size_bytes;
        }
    }

    /// Evict entries until `needed_size` more bytes and one more entry fit
    fn evict_if_needed(
        &self,
        inner: &mut StoreInner,
        needed_size: usize,
    ) -> std::result::Result<(), CacheError> {
        if needed_size > self.config.max_size_bytes {
            return Err(CacheError::Rejected(format!(
                "value of {} bytes exceeds store limit of {} bytes",
                needed_size, self.config.max_size_bytes
            )));
        }

        while inner.entries.len() >= self.config.max_entries {
            match inner.lru_queue.pop_front() {
                Some(key) => {
                    debug!("Evicting entry due to max_entries limit: {}", key);
                    Self::remove_entry(inner, &key);
                    inner.stats.evictions_size += 1;
                }
                None => break,
            }
        }

        while inner.current_size_bytes + needed_size > self.config.max_size_bytes {
            match inner.lru_queue.pop_front() {
                Some(key) => {
                    debug!("Evicting entry due to size limit: {}", key);
                    Self::remove_entry(inner, &key);
                    inner.stats.evictions_size += 1;
                }
                None => {
                    warn!("Cannot evict more entries, cache size limit exceeded");
                    return Err(CacheError::Rejected(
                        "cache size limit exceeded".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> std::result::Result<Option<CacheValue>, CacheError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            None => {
                debug!("Cache miss: {}", key);
                inner.stats.misses += 1;
                return Ok(None);
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            inner.stats.misses += 1;
            inner.stats.evictions_ttl += 1;
            Self::remove_entry(inner, key);
            return Ok(None);
        }

        let value = match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.mark_accessed();
                entry.value.clone()
            }
            None => return Ok(None),
        };
        inner.stats.hits += 1;

        if self.config.enable_lru_eviction {
            inner.lru_queue.retain(|k| k != key);
            inner.lru_queue.push_back(key.to_string());
        }

        debug!("Cache hit: {}", key);
        Ok(Some(value))
    }

    async fn set(
        &self,
        key: &str,
        value: CacheValue,
        ttl_seconds: u64,
    ) -> std::result::Result<(), CacheError> {
        if ttl_seconds == 0 {
            return Err(CacheError::Rejected(
                "ttl must be at least one second".to_string(),
            ));
        }

        let ttl = self
            .config
            .ttl_with_jitter(Duration::from_secs(ttl_seconds));
        let entry = StoredEntry::new(key.to_string(), value, ttl);
        let size = entry.size_bytes;

        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        // Replacing an entry frees its slot before limits are checked
        if inner.entries.contains_key(key) {
            debug!("Updating existing cache entry: {}", key);
            Self::remove_entry(inner, key);
        } else {
            debug!("Inserting new cache entry: {}", key);
        }

        self.evict_if_needed(inner, size)?;

        inner.entries.insert(key.to_string(), entry);
        inner.lru_queue.push_back(key.to_string());
        inner.current_size_bytes += size;
        inner.stats.entries = inner.entries.len();
        inner.stats.size_bytes = inner.current_size_bytes;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Background task for automatic cleanup. Returns immediately when auto
/// cleanup is disabled in the store configuration.
pub async fn start_auto_cleanup(store: Arc<MemoryStore>) {
    if !store.config.enable_auto_cleanup {
        debug!("Automatic cache cleanup disabled");
        return;
    }

    let interval = store.config.cleanup_interval;
    info!("Starting automatic cache cleanup task (interval: {:?})", interval);

    loop {
        tokio::time::sleep(interval).await;

        let removed = store.cleanup_expired().await;
        if removed > 0 {
            debug!("Auto cleanup removed {} entries", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(config: MemoryStoreConfig) -> MemoryStore {
        MemoryStore::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_basic_set_and_get() {
        let store = store(MemoryStoreConfig::builder().max_entries(100).build());

        store.set("key1", "value1".to_string(), 60).await.unwrap();

        let value = store.get("key1").await.unwrap();
        assert_eq!(value, Some("value1".to_string()));

        let stats = store.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let store = store(MemoryStoreConfig::default());

        let value = store.get("nonexistent").await.unwrap();
        assert_eq!(value, None);

        let stats = store.stats().await;
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let store = store(MemoryStoreConfig::default());

        let err = store.set("key1", "value1".to_string(), 0).await.unwrap_err();
        assert!(matches!(err, CacheError::Rejected(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let store = store(MemoryStoreConfig::default());

        store.set("key1", "value1".to_string(), 1).await.unwrap();
        assert!(store.get("key1").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(store.get("key1").await.unwrap().is_none());
        let stats = store.stats().await;
        assert_eq!(stats.evictions_ttl, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let store = store(
            MemoryStoreConfig::builder()
                .max_entries(3)
                .enable_lru_eviction(true)
                .build(),
        );

        store.set("key1", "value1".to_string(), 60).await.unwrap();
        store.set("key2", "value2".to_string(), 60).await.unwrap();
        store.set("key3", "value3".to_string(), 60).await.unwrap();

        // key1 becomes the most recently used
        store.get("key1").await.unwrap();

        store.set("key4", "value4".to_string(), 60).await.unwrap();

        assert!(store.get("key2").await.unwrap().is_none());
        assert!(store.get("key1").await.unwrap().is_some());
        assert!(store.get("key3").await.unwrap().is_some());
        assert!(store.get("key4").await.unwrap().is_some());

        let stats = store.stats().await;
        assert_eq!(stats.evictions_size, 1);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_entry() {
        let store = store(MemoryStoreConfig::builder().max_entries(2).build());

        store.set("key1", "v1".to_string(), 60).await.unwrap();
        store.set("key2", "v2".to_string(), 60).await.unwrap();
        store.set("key1", "v1-new".to_string(), 60).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.get("key1").await.unwrap(), Some("v1-new".to_string()));
        assert_eq!(store.get("key2").await.unwrap(), Some("v2".to_string()));
        assert_eq!(store.stats().await.evictions_size, 0);
    }

    #[tokio::test]
    async fn test_oversized_value_rejected() {
        let store = store(MemoryStoreConfig::builder().max_size_bytes(256).build());

        let err = store.set("big", "v".repeat(1024), 60).await.unwrap_err();
        assert!(matches!(err, CacheError::Rejected(_)));
        assert!(!store.contains_key("big").await);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = store(MemoryStoreConfig::default());

        store.set("key1", "value1".to_string(), 1).await.unwrap();
        store.set("key2", "value2".to_string(), 1).await.unwrap();
        store.set("key3", "value3".to_string(), 600).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(store.cleanup_expired().await, 2);
        assert_eq!(store.len().await, 1);
        assert!(store.contains_key("key3").await);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MemoryStoreConfig::builder().max_entries(0).build();
        assert!(MemoryStore::new(config).is_err());
    }

    #[test]
    fn test_store_stats_rates() {
        let stats = StoreStats {
            hits: 3,
            misses: 1,
            evictions_size: 2,
            evictions_ttl: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 75.0);
        assert_eq!(stats.total_evictions(), 3);
    }
}
