//! Cache-aside orchestration
//!
//! [`QueryCache`] derives a key for each query, then applies the call's
//! [`Policy`]:
//!
//! - `Skip`: run the query, never touch the store.
//! - `Refresh`: run the query, then write the result.
//! - `Cache`: read the store first. A decodable value is returned without
//!   running the query. On a miss (or an undecodable value) the query runs and
//!   the result is written. If the read itself failed, the query runs and no
//!   write is attempted.
//!
//! Only executor failures reach the caller. Cache failures become
//! [`CacheEvent`]s.
//!
//! Both calling conventions run the same routine. [`QueryCache::query`]
//! awaits the cache write before returning; [`QueryCache::query_with_callback`]
//! detaches it, so the callback can fire before the write lands.

use crate::cache::codec;
use crate::cache::config::{CacheConfig, QueryOptions, ResolvedOptions};
use crate::cache::events::{AtomicStats, CacheEvent, CacheObserver, TracingObserver};
use crate::cache::key::resolve_key;
use crate::cache::store::CacheStore;
use crate::cache::types::{CacheKey, CacheStats, Policy};
use crate::error::{ExecutorError, Result};
use crate::executor::QueryExecutor;
use crate::result::{QueryResult, ResultSource};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// How the post-execution cache write relates to the caller's completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// The write finishes before the call completes
    Awaited,
    /// The write runs on its own task
    Detached,
}

/// Cache-aside layer over a query executor and a cache store
///
/// Cheap to clone; clones share backends, configuration and statistics.
#[derive(Clone)]
pub struct QueryCache {
    executor: Arc<dyn QueryExecutor>,
    store: Arc<dyn CacheStore>,
    config: Arc<CacheConfig>,
    observer: Arc<dyn CacheObserver>,
    stats: Arc<AtomicStats>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("store", &self.store.name())
            .field("config", &self.config)
            .finish()
    }
}

impl QueryCache {
    /// Create a cache layer with `config` as the instance defaults
    ///
    /// # Example
    /// ```no_run
    /// use ouroboros_sqlcache::{CacheConfig, MemoryStore, MemoryStoreConfig, QueryCache, QueryOptions};
    /// # use ouroboros_sqlcache::{QueryExecutor, QueryResult, ExecutorError};
    /// # struct Db;
    /// # #[async_trait::async_trait]
    /// # impl QueryExecutor for Db {
    /// #     async fn execute(&self, _: &str, _: &[serde_json::Value]) -> Result<QueryResult, ExecutorError> {
    /// #         Ok(QueryResult::default())
    /// #     }
    /// # }
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let store = MemoryStore::new(MemoryStoreConfig::default())?;
    ///     let cache = QueryCache::new(Db, store, CacheConfig::default())?;
    ///
    ///     let result = cache
    ///         .query("select 1+?", &[serde_json::json!(2)], &QueryOptions::default())
    ///         .await?;
    ///     println!("served from cache: {:?}", result.cache_hit());
    ///     Ok(())
    /// }
    /// ```
    pub fn new<E, S>(executor: E, store: S, config: CacheConfig) -> Result<Self>
    where
        E: QueryExecutor + 'static,
        S: CacheStore + 'static,
    {
        config.validate()?;
        info!(
            "Initializing query cache over {} store (prefix: {:?}, hash: {}, policy: {})",
            store.name(),
            config.key_prefix,
            config.hash_strategy,
            config.policy
        );

        Ok(Self {
            executor: Arc::new(executor),
            store: Arc::new(store),
            config: Arc::new(config),
            observer: Arc::new(TracingObserver),
            stats: Arc::new(AtomicStats::default()),
        })
    }

    /// Replace the event observer (defaults to [`TracingObserver`])
    pub fn with_observer(mut self, observer: impl CacheObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Instance defaults
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Counters accumulated by this instance and its clones
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Key a call with these arguments would use
    pub fn key_for(&self, sql: &str, params: &[Value], options: &QueryOptions) -> CacheKey {
        resolve_key(&self.config.resolve(options), sql, params)
    }

    /// Run a query through the cache, resolving once the result is known and
    /// any cache write has finished.
    pub async fn query(
        &self,
        sql: &str,
        params: &[Value],
        options: &QueryOptions,
    ) -> std::result::Result<QueryResult, ExecutorError> {
        self.run(sql, params, options, WriteMode::Awaited).await
    }

    /// Run a query through the cache on a spawned task and hand the outcome
    /// to `callback`, which is invoked exactly once.
    ///
    /// The cache write is detached from the callback.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn query_with_callback<F>(
        &self,
        sql: impl Into<String>,
        params: Vec<Value>,
        options: QueryOptions,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(std::result::Result<QueryResult, ExecutorError>) + Send + 'static,
    {
        let cache = self.clone();
        let sql = sql.into();

        tokio::spawn(async move {
            let outcome = cache.run(&sql, &params, &options, WriteMode::Detached).await;
            callback(outcome);
        })
    }

    async fn run(
        &self,
        sql: &str,
        params: &[Value],
        options: &QueryOptions,
        mode: WriteMode,
    ) -> std::result::Result<QueryResult, ExecutorError> {
        let resolved = self.config.resolve(options);

        match resolved.policy {
            Policy::Skip => {
                self.emit(CacheEvent::Bypassed);
                self.execute(sql, params).await
            }
            Policy::Refresh => {
                let key = resolve_key(&resolved, sql, params);
                let result = self.execute(sql, params).await?;
                self.write(key, &result, &resolved, mode).await;
                Ok(result)
            }
            Policy::Cache => self.read_through(sql, params, &resolved, mode).await,
        }
    }

    async fn read_through(
        &self,
        sql: &str,
        params: &[Value],
        resolved: &ResolvedOptions,
        mode: WriteMode,
    ) -> std::result::Result<QueryResult, ExecutorError> {
        let key = resolve_key(resolved, sql, params);

        let lookup = self.store.get(&key).await;
        let write_back = match lookup {
            Ok(Some(value)) => match codec::decode(&value, &key) {
                Ok(hit) => {
                    self.emit(CacheEvent::Hit { key });
                    return Ok(hit);
                }
                Err(e) => {
                    self.emit(CacheEvent::DecodeFailed {
                        key: key.clone(),
                        error: e.to_string(),
                    });
                    true
                }
            },
            Ok(None) => {
                self.emit(CacheEvent::Miss { key: key.clone() });
                true
            }
            Err(error) => {
                // store assumed unhealthy: no write for this call
                self.emit(CacheEvent::ReadFailed {
                    key: key.clone(),
                    error,
                });
                false
            }
        };

        let result = self.execute(sql, params).await?;
        if write_back {
            self.write(key, &result, resolved, mode).await;
        }
        Ok(result)
    }

    async fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> std::result::Result<QueryResult, ExecutorError> {
        self.stats.record_executor_call();

        match self.executor.execute(sql, params).await {
            Ok(result) => Ok(result.with_source(ResultSource::Executor)),
            Err(e) => {
                debug!("Query failed: {}", e);
                Err(e)
            }
        }
    }

    async fn write(
        &self,
        key: CacheKey,
        result: &QueryResult,
        resolved: &ResolvedOptions,
        mode: WriteMode,
    ) {
        let ttl_seconds = resolved.ttl_seconds;
        if ttl_seconds == 0 {
            self.emit(CacheEvent::WriteSkipped { key });
            return;
        }

        let value = match codec::encode(result) {
            Ok(value) => value,
            Err(e) => {
                self.emit(CacheEvent::EncodeFailed {
                    key,
                    error: e.to_string(),
                });
                return;
            }
        };

        match mode {
            WriteMode::Awaited => self.store_value(key, value, ttl_seconds).await,
            WriteMode::Detached => {
                let cache = self.clone();
                tokio::spawn(async move {
                    cache.store_value(key, value, ttl_seconds).await;
                });
            }
        }
    }

    async fn store_value(&self, key: CacheKey, value: String, ttl_seconds: u64) {
        match self.store.set(&key, value, ttl_seconds).await {
            Ok(()) => self.emit(CacheEvent::Written { key, ttl_seconds }),
            Err(error) => self.emit(CacheEvent::WriteFailed { key, error }),
        }
    }

    fn emit(&self, event: CacheEvent) {
        self.stats.record(&event);
        self.observer.on_event(&event);
    }
}
