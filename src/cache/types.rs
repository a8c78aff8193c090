//! Core type definitions for the cache layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cache key type - prefix followed by the derived or pinned suffix
pub type CacheKey = String;

/// Cache value type - encoded query result payload
pub type CacheValue = String;

/// Algorithm used to fold query text and parameters into a key suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashStrategy {
    /// 32-bit farmhash fingerprint, densely encoded
    #[default]
    Farmhash32,

    /// 64-bit farmhash fingerprint, densely encoded
    Farmhash64,

    /// BLAKE2b-512 digest, base64
    Blake2b512,

    /// MD5 digest, base64. Also the fallback when farmhash is not compiled in.
    Md5,

    /// Raw query text followed by the serialized parameters
    #[serde(alias = "full")]
    Verbatim,
}

impl HashStrategy {
    /// All strategies, in declaration order
    pub const ALL: [HashStrategy; 5] = [
        HashStrategy::Farmhash32,
        HashStrategy::Farmhash64,
        HashStrategy::Blake2b512,
        HashStrategy::Md5,
        HashStrategy::Verbatim,
    ];

    /// Strategy actually used for derivation in this build.
    ///
    /// Farmhash strategies map to [`HashStrategy::Md5`] when the `farmhash`
    /// feature is disabled.
    pub fn effective(self) -> HashStrategy {
        match self {
            HashStrategy::Farmhash32 | HashStrategy::Farmhash64 if !cfg!(feature = "farmhash") => {
                HashStrategy::Md5
            }
            other => other,
        }
    }

    /// Whether the strategy produces a fixed-length, non-reversible suffix
    pub fn is_hashed(self) -> bool {
        !matches!(self, HashStrategy::Verbatim)
    }
}

impl fmt::Display for HashStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashStrategy::Farmhash32 => write!(f, "farmhash32"),
            HashStrategy::Farmhash64 => write!(f, "farmhash64"),
            HashStrategy::Blake2b512 => write!(f, "blake2b512"),
            HashStrategy::Md5 => write!(f, "md5"),
            HashStrategy::Verbatim => write!(f, "verbatim"),
        }
    }
}

impl FromStr for HashStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "farmhash32" => Ok(HashStrategy::Farmhash32),
            "farmhash64" => Ok(HashStrategy::Farmhash64),
            "blake2b512" => Ok(HashStrategy::Blake2b512),
            "md5" => Ok(HashStrategy::Md5),
            "verbatim" | "full" => Ok(HashStrategy::Verbatim),
            other => Err(format!("unknown hash strategy: {}", other)),
        }
    }
}

/// Per-call execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Read the cache first, fall back to the executor and populate on miss
    #[default]
    Cache,

    /// Bypass the cache entirely
    Skip,

    /// Always execute, then overwrite the cache entry
    Refresh,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Cache => write!(f, "cache"),
            Policy::Skip => write!(f, "skip"),
            Policy::Refresh => write!(f, "refresh"),
        }
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache" => Ok(Policy::Cache),
            "skip" => Ok(Policy::Skip),
            "refresh" => Ok(Policy::Refresh),
            other => Err(format!("unknown caching policy: {}", other)),
        }
    }
}

/// Snapshot of orchestrator counters
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Queries served from the cache
    pub hits: u64,

    /// Cache reads that found nothing
    pub misses: u64,

    /// Cache reads that failed
    pub read_errors: u64,

    /// Stored payloads that failed to decode
    pub decode_errors: u64,

    /// Successful cache writes
    pub writes: u64,

    /// Failed cache writes (including encode failures)
    pub write_errors: u64,

    /// Calls that went to the executor
    pub executor_calls: u64,

    /// Calls made with [`Policy::Skip`]
    pub bypassed: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage of cache reads
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.read_errors + self.decode_errors;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }

    /// Total cache-layer failures, all of which were absorbed
    pub fn total_errors(&self) -> u64 {
        self.read_errors + self.decode_errors + self.write_errors
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, writes: {}, executor_calls: {}, errors: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.writes,
            self.executor_calls,
            self.total_errors()
        )
    }
}
