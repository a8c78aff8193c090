//! # Cache side of the query layer
//!
//! Everything that happens between "a query came in" and "a value was read
//! from or written to a store":
//!
//! - **Key derivation** ([`key`], [`string64`]): query text plus JSON-encoded
//!   parameters, optionally hashed, behind a configurable prefix
//! - **Payload codec** ([`codec`]): a versioned JSON envelope around result rows
//!   and field metadata
//! - **Stores** ([`store`]): the [`CacheStore`] trait, the bundled
//!   [`MemoryStore`] with TTL expiry and LRU eviction, and a Redis store behind
//!   the `redis` feature
//! - **Events** ([`events`]): non-fatal cache outcomes reported to a
//!   [`CacheObserver`]
//!
//! ## Example
//!
//! ```rust
//! use ouroboros_sqlcache::cache::{cache_key, HashStrategy};
//!
//! let key = cache_key("sql.", "select 1+2", &[], HashStrategy::Verbatim);
//! assert_eq!(key, "sql.select 1+2[]");
//! ```

pub mod codec;
pub mod config;
pub mod entry;
pub mod events;
pub mod key;
#[cfg(feature = "redis")]
pub mod redis;
pub mod store;
pub mod string64;
pub mod types;

pub use config::{
    CacheConfig, CacheConfigBuilder, MemoryStoreConfig, MemoryStoreConfigBuilder, QueryOptions,
    ResolvedOptions, DEFAULT_KEY_PREFIX, DEFAULT_TTL_SECONDS,
};
pub use entry::StoredEntry;
pub use events::{CacheEvent, CacheObserver, NoopObserver, TracingObserver};
pub use key::{cache_key, derive_key, hash_input, key_input, resolve_key};
#[cfg(feature = "redis")]
pub use redis::RedisStore;
pub use store::{start_auto_cleanup, CacheStore, MemoryStore, StoreStats};
pub use types::{CacheKey, CacheStats, CacheValue, HashStrategy, Policy};
