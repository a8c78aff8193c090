//! Stored entry for the in-process memory store

use crate::cache::types::{CacheKey, CacheValue};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A value held by [`MemoryStore`](crate::cache::MemoryStore) with its expiry
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// The cache key
    pub key: CacheKey,

    /// The stored value
    pub value: CacheValue,

    /// When the entry expires
    pub expires_at: DateTime<Utc>,

    /// Last read time (for LRU tracking)
    pub accessed_at: DateTime<Utc>,

    /// Number of reads served
    pub access_count: u64,

    /// Approximate footprint in bytes
    pub size_bytes: usize,
}

impl StoredEntry {
    /// Create an entry expiring `ttl` from now
    pub fn new(key: CacheKey, value: CacheValue, ttl: Duration) -> Self {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entry = Self {
            key,
            value,
            expires_at,
            accessed_at: now,
            access_count: 0,
            size_bytes: 0,
        };
        entry.size_bytes = entry.calculate_size();
        entry
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Get time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now();
        if now >= self.expires_at {
            None
        } else {
            (self.expires_at - now).to_std().ok()
        }
    }

    /// Mark the entry as read
    pub fn mark_accessed(&mut self) {
        self.accessed_at = Utc::now();
        self.access_count += 1;
    }

    /// Approximate size: key + value + bookkeeping
    pub fn calculate_size(&self) -> usize {
        self.key.len() + self.value.len() + std::mem::size_of::<Self>()
    }
}
