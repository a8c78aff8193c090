//! # Ouroboros SQL Cache (ouroboros-sqlcache)
//!
//! A cache-aside layer for SQL queries. Results are looked up in a key-value
//! store before the database is asked, and written back after it answers.
//!
//! ## Features
//!
//! - Deterministic cache keys from query text and parameters, with several
//!   hash strategies (FarmHash 32/64, BLAKE2b-512, MD5, verbatim)
//! - Per-call policy: serve from cache, bypass it, or force a refresh
//! - Layered configuration: built-in defaults, instance config, per-call options
//! - Cache failures never fail a query; they are reported as [`CacheEvent`]s
//! - Future and callback calling conventions over one algorithm
//! - Pluggable stores: in-process [`MemoryStore`], Redis behind the `redis` feature
//!
//! ## Cached Query
//!
//! ```no_run
//! use ouroboros_sqlcache::{
//!     CacheConfig, ExecutorError, MemoryStore, MemoryStoreConfig, QueryCache, QueryExecutor,
//!     QueryOptions, QueryResult,
//! };
//! use serde_json::{json, Value};
//!
//! struct Database;
//!
//! #[async_trait::async_trait]
//! impl QueryExecutor for Database {
//!     async fn execute(&self, _sql: &str, _params: &[Value]) -> Result<QueryResult, ExecutorError> {
//!         Ok(QueryResult::single(vec![json!({ "1+2": 3 })], vec![]))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MemoryStore::new(MemoryStoreConfig::default())?;
//!     let cache = QueryCache::new(Database, store, CacheConfig::from_env()?)?;
//!
//!     // First call runs the query, second is served from the store
//!     let options = QueryOptions::default();
//!     cache.query("select 1+?", &[json!(2)], &options).await?;
//!     let result = cache.query("select 1+?", &[json!(2)], &options).await?;
//!     assert!(result.is_cache_hit());
//!     Ok(())
//! }
//! ```
//!
//! ## Bypass and Refresh
//!
//! ```no_run
//! # use ouroboros_sqlcache::{QueryCache, QueryOptions};
//! # async fn example(cache: QueryCache) -> anyhow::Result<()> {
//! // Never touches the store
//! cache.query("select now()", &[], &QueryOptions::skip()).await?;
//!
//! // Always runs the query and overwrites the stored result
//! cache.query("select count(*) from users", &[], &QueryOptions::refresh()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Callback Style
//!
//! ```no_run
//! # use ouroboros_sqlcache::{QueryCache, QueryOptions};
//! # async fn example(cache: QueryCache) {
//! let handle = cache.query_with_callback(
//!     "select 1",
//!     vec![],
//!     QueryOptions::default(),
//!     |outcome| match outcome {
//!         Ok(result) => println!("{} rows", result.row_count()),
//!         Err(e) => eprintln!("query failed: {}", e),
//!     },
//! );
//! handle.await.ok();
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod executor;
pub mod query_cache;
pub mod result;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheConfigBuilder, CacheEvent, CacheKey, CacheObserver, CacheStats, CacheStore,
    CacheValue, HashStrategy, MemoryStore, MemoryStoreConfig, NoopObserver, Policy, QueryOptions,
    StoreStats, TracingObserver,
};
#[cfg(feature = "redis")]
pub use cache::RedisStore;
pub use error::{CacheError, CodecError, Error, ExecutorError, Result};
pub use executor::QueryExecutor;
pub use query_cache::QueryCache;
pub use result::{Field, QueryResult, ResultSource, Row, Rows};
