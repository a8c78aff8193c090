//! Observability hook for non-fatal cache outcomes
//!
//! Cache failures never fail a query, so they are reported here instead of
//! being discarded. Every [`CacheEvent`] is counted in the orchestrator's
//! statistics and handed to its [`CacheObserver`].

use crate::cache::types::{CacheKey, CacheStats};
use crate::error::CacheError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Something that happened on the cache side of a query
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    /// Served from the cache
    Hit { key: CacheKey },

    /// Nothing stored under the key
    Miss { key: CacheKey },

    /// The store failed on read; the call continues without a write
    ReadFailed { key: CacheKey, error: CacheError },

    /// A stored value could not be decoded; treated as a miss
    DecodeFailed { key: CacheKey, error: String },

    /// Result written to the store
    Written { key: CacheKey, ttl_seconds: u64 },

    /// The store failed on write
    WriteFailed { key: CacheKey, error: CacheError },

    /// The result could not be encoded for storage
    EncodeFailed { key: CacheKey, error: String },

    /// Write not attempted because the entry would expire immediately
    WriteSkipped { key: CacheKey },

    /// The call bypassed the cache
    Bypassed,
}

impl CacheEvent {
    /// Key involved, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            CacheEvent::Hit { key }
            | CacheEvent::Miss { key }
            | CacheEvent::ReadFailed { key, .. }
            | CacheEvent::DecodeFailed { key, .. }
            | CacheEvent::Written { key, .. }
            | CacheEvent::WriteFailed { key, .. }
            | CacheEvent::EncodeFailed { key, .. }
            | CacheEvent::WriteSkipped { key } => Some(key),
            CacheEvent::Bypassed => None,
        }
    }

    /// Whether the event reports a cache-layer failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CacheEvent::ReadFailed { .. }
                | CacheEvent::DecodeFailed { .. }
                | CacheEvent::WriteFailed { .. }
                | CacheEvent::EncodeFailed { .. }
        )
    }
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEvent::Hit { key } => write!(f, "cache hit: {}", key),
            CacheEvent::Miss { key } => write!(f, "cache miss: {}", key),
            CacheEvent::ReadFailed { key, error } => {
                write!(f, "cache read failed for {}: {}", key, error)
            }
            CacheEvent::DecodeFailed { key, error } => {
                write!(f, "cached value for {} could not be decoded: {}", key, error)
            }
            CacheEvent::Written { key, ttl_seconds } => {
                write!(f, "cached {} for {}s", key, ttl_seconds)
            }
            CacheEvent::WriteFailed { key, error } => {
                write!(f, "cache write failed for {}: {}", key, error)
            }
            CacheEvent::EncodeFailed { key, error } => {
                write!(f, "result for {} could not be encoded: {}", key, error)
            }
            CacheEvent::WriteSkipped { key } => {
                write!(f, "cache write skipped for {}: ttl is zero", key)
            }
            CacheEvent::Bypassed => write!(f, "cache bypassed"),
        }
    }
}

/// Receives cache events. Called inline; implementations must not block.
pub trait CacheObserver: Send + Sync {
    fn on_event(&self, event: &CacheEvent);
}

/// Logs events through `tracing`: failures at `warn`, the rest at `debug`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_event(&self, event: &CacheEvent) {
        if event.is_failure() {
            warn!("{}", event);
        } else {
            debug!("{}", event);
        }
    }
}

/// Discards events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {
    fn on_event(&self, _event: &CacheEvent) {}
}

/// Lock-free counters behind [`CacheStats`]
#[derive(Debug, Default)]
pub(crate) struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    read_errors: AtomicU64,
    decode_errors: AtomicU64,
    writes: AtomicU64,
    write_errors: AtomicU64,
    executor_calls: AtomicU64,
    bypassed: AtomicU64,
}

impl AtomicStats {
    pub(crate) fn record(&self, event: &CacheEvent) {
        let counter = match event {
            CacheEvent::Hit { .. } => &self.hits,
            CacheEvent::Miss { .. } => &self.misses,
            CacheEvent::ReadFailed { .. } => &self.read_errors,
            CacheEvent::DecodeFailed { .. } => &self.decode_errors,
            CacheEvent::Written { .. } => &self.writes,
            CacheEvent::WriteFailed { .. } | CacheEvent::EncodeFailed { .. } => &self.write_errors,
            CacheEvent::Bypassed => &self.bypassed,
            CacheEvent::WriteSkipped { .. } => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_executor_call(&self) {
        self.executor_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            executor_calls: self.executor_calls.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
        }
    }
}
