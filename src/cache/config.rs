//! Configuration for the cache layer
//!
//! Settings are layered per field: a [`QueryOptions`] override wins over the
//! instance [`CacheConfig`], which was itself filled from the built-in
//! defaults by [`CacheConfigBuilder`]. Presence is decided by `Option`, never
//! by the value, so `0`, `""` and friends are ordinary overrides.

use crate::cache::types::{HashStrategy, Policy};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default entry lifetime: 2629746 seconds (an average month)
pub const DEFAULT_TTL_SECONDS: u64 = 2_629_746;

/// Default namespace for derived keys
pub const DEFAULT_KEY_PREFIX: &str = "sql.";

pub const ENV_TTL_SECONDS: &str = "SQLCACHE_TTL_SECONDS";
pub const ENV_KEY_PREFIX: &str = "SQLCACHE_KEY_PREFIX";
pub const ENV_HASH_STRATEGY: &str = "SQLCACHE_HASH_STRATEGY";
pub const ENV_POLICY: &str = "SQLCACHE_POLICY";

/// Instance-wide defaults for cached queries
///
/// `ttl_seconds == 0` means the entry would expire immediately. The
/// orchestrator does not write such entries at all; it is not treated as
/// "unset" and it does not mean "never expire".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime handed to the cache store with every write
    pub ttl_seconds: u64,

    /// Prefix of every key
    pub key_prefix: String,

    /// Algorithm for the key suffix
    pub hash_strategy: HashStrategy,

    /// Execution mode when the call does not choose one
    pub policy: Policy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            hash_strategy: HashStrategy::default(),
            policy: Policy::default(),
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.key_prefix.chars().any(char::is_whitespace) {
            return Err(Error::ConfigError(
                "key_prefix must not contain whitespace".to_string(),
            ));
        }

        Ok(())
    }

    /// TTL as a [`Duration`]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Load configuration from the environment (after reading `.env` if present).
    ///
    /// Unset variables keep their built-in default; malformed values are errors.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = CacheConfig::builder();

        if let Some(raw) = lookup(ENV_TTL_SECONDS) {
            let ttl = raw.trim().parse::<u64>().map_err(|e| {
                Error::ConfigError(format!("{} must be an integer: {}", ENV_TTL_SECONDS, e))
            })?;
            builder = builder.ttl_seconds(ttl);
        }

        if let Some(prefix) = lookup(ENV_KEY_PREFIX) {
            builder = builder.key_prefix(prefix);
        }

        if let Some(raw) = lookup(ENV_HASH_STRATEGY) {
            let strategy = raw.parse::<HashStrategy>().map_err(Error::ConfigError)?;
            builder = builder.hash_strategy(strategy);
        }

        if let Some(raw) = lookup(ENV_POLICY) {
            let policy = raw.parse::<Policy>().map_err(Error::ConfigError)?;
            builder = builder.policy(policy);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }

    /// Resolve per-call options against these defaults
    pub fn resolve(&self, options: &QueryOptions) -> ResolvedOptions {
        ResolvedOptions {
            ttl_seconds: options.ttl_seconds.unwrap_or(self.ttl_seconds),
            key_prefix: options
                .key_prefix
                .clone()
                .unwrap_or_else(|| self.key_prefix.clone()),
            hash_strategy: options.hash_strategy.unwrap_or(self.hash_strategy),
            policy: options.policy.unwrap_or(self.policy),
            pinned_hash: options.hash.clone(),
        }
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    ttl_seconds: Option<u64>,
    key_prefix: Option<String>,
    hash_strategy: Option<HashStrategy>,
    policy: Option<Policy>,
}

impl CacheConfigBuilder {
    /// Set the entry lifetime in seconds
    pub fn ttl_seconds(mut self, ttl: u64) -> Self {
        self.ttl_seconds = Some(ttl);
        self
    }

    /// Set the entry lifetime from a duration (whole seconds)
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl_seconds = Some(ttl.as_secs());
        self
    }

    /// Set the key prefix
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Set the hash strategy
    pub fn hash_strategy(mut self, strategy: HashStrategy) -> Self {
        self.hash_strategy = Some(strategy);
        self
    }

    /// Set the default policy
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            ttl_seconds: self.ttl_seconds.unwrap_or(defaults.ttl_seconds),
            key_prefix: self.key_prefix.unwrap_or(defaults.key_prefix),
            hash_strategy: self.hash_strategy.unwrap_or(defaults.hash_strategy),
            policy: self.policy.unwrap_or(defaults.policy),
        }
    }
}

/// Per-call overrides. Unset fields fall back to the instance configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_strategy: Option<HashStrategy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,

    /// Precomputed key suffix, used in place of the derived one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl_seconds(mut self, ttl: u64) -> Self {
        self.ttl_seconds = Some(ttl);
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn hash_strategy(mut self, strategy: HashStrategy) -> Self {
        self.hash_strategy = Some(strategy);
        self
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Pin the key suffix for this call
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Shorthand for [`Policy::Skip`]
    pub fn skip() -> Self {
        Self::new().policy(Policy::Skip)
    }

    /// Shorthand for [`Policy::Refresh`]
    pub fn refresh() -> Self {
        Self::new().policy(Policy::Refresh)
    }
}

/// Fully resolved settings for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub ttl_seconds: u64,
    pub key_prefix: String,
    pub hash_strategy: HashStrategy,
    pub policy: Policy,
    pub pinned_hash: Option<String>,
}

/// Configuration for the in-process [`MemoryStore`](crate::cache::MemoryStore)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStoreConfig {
    /// Maximum number of entries in the store
    pub max_entries: usize,

    /// Maximum total size of stored data in bytes
    pub max_size_bytes: usize,

    /// TTL jitter factor (0.0 - 1.0) applied to every write
    pub ttl_jitter: f64,

    /// Enable automatic cleanup of expired entries
    pub enable_auto_cleanup: bool,

    /// Interval for automatic cleanup checks
    pub cleanup_interval: Duration,

    /// Move entries to the back of the eviction queue on read
    pub enable_lru_eviction: bool,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            // 100 MB
            max_size_bytes: 100 * 1024 * 1024,
            ttl_jitter: 0.0,
            enable_auto_cleanup: true,
            cleanup_interval: Duration::from_secs(300),
            enable_lru_eviction: true,
        }
    }
}

impl MemoryStoreConfig {
    /// Create a new builder for memory store configuration
    pub fn builder() -> MemoryStoreConfigBuilder {
        MemoryStoreConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(Error::ConfigError(
                "max_entries must be greater than 0".to_string(),
            ));
        }

        if self.max_size_bytes == 0 {
            return Err(Error::ConfigError(
                "max_size_bytes must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(Error::ConfigError(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply jitter to a TTL. A zero TTL stays zero.
    pub fn ttl_with_jitter(&self, ttl: Duration) -> Duration {
        if self.ttl_jitter == 0.0 || ttl.is_zero() {
            return ttl;
        }

        let base_secs = ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(1.0);

        Duration::from_secs_f64(final_secs)
    }
}

/// Builder for memory store configuration
#[derive(Debug, Default)]
pub struct MemoryStoreConfigBuilder {
    max_entries: Option<usize>,
    max_size_bytes: Option<usize>,
    ttl_jitter: Option<f64>,
    enable_auto_cleanup: Option<bool>,
    cleanup_interval: Option<Duration>,
    enable_lru_eviction: Option<bool>,
}

impl MemoryStoreConfigBuilder {
    /// Set maximum number of entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Set maximum store size in bytes
    pub fn max_size_bytes(mut self, size: usize) -> Self {
        self.max_size_bytes = Some(size);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Enable or disable automatic cleanup
    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.enable_auto_cleanup = Some(enable);
        self
    }

    /// Set cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Enable or disable LRU eviction
    pub fn enable_lru_eviction(mut self, enable: bool) -> Self {
        self.enable_lru_eviction = Some(enable);
        self
    }

    /// Build the memory store configuration
    pub fn build(self) -> MemoryStoreConfig {
        let defaults = MemoryStoreConfig::default();

        MemoryStoreConfig {
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            max_size_bytes: self.max_size_bytes.unwrap_or(defaults.max_size_bytes),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            enable_auto_cleanup: self
                .enable_auto_cleanup
                .unwrap_or(defaults.enable_auto_cleanup),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
            enable_lru_eviction: self
                .enable_lru_eviction
                .unwrap_or(defaults.enable_lru_eviction),
        }
    }
}
