//! Cache-Aside Demo Application
//!
//! Runs the same query through every policy against an in-process store and
//! a fake database that sleeps to make cache hits visible.
//!
//! Usage:
//!   cargo run --example cache_aside
//!
//! Environment variables:
//!   SQLCACHE_TTL_SECONDS   - entry lifetime (default: 2629746)
//!   SQLCACHE_KEY_PREFIX    - key prefix (default: sql.)
//!   SQLCACHE_HASH_STRATEGY - farmhash32, farmhash64, blake2b512, md5, verbatim
//!   SQLCACHE_POLICY        - cache, skip, refresh
//!   RUST_LOG               - log filter (default: info,ouroboros_sqlcache=debug)

use async_trait::async_trait;
use ouroboros_sqlcache::{
    CacheConfig, ExecutorError, MemoryStore, MemoryStoreConfig, QueryCache, QueryExecutor,
    QueryOptions, QueryResult,
};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pretends to be a database that needs 200ms per statement
struct SlowDatabase;

#[async_trait]
impl QueryExecutor for SlowDatabase {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult, ExecutorError> {
        tokio::time::sleep(Duration::from_millis(200)).await;

        if sql.trim().is_empty() {
            return Err(ExecutorError::QueryError("empty statement".to_string()));
        }

        let sum = 1 + params.first().and_then(Value::as_i64).unwrap_or(0);
        Ok(QueryResult::single(vec![json!({ "result": sum })], vec![]))
    }
}

async fn timed(cache: &QueryCache, label: &str, options: &QueryOptions) -> anyhow::Result<()> {
    let started = Instant::now();
    let result = cache.query("select 1+?", &[json!(2)], options).await?;

    info!(
        "{:<8} {:>4}ms  rows={:?}  from_cache={}",
        label,
        started.elapsed().as_millis(),
        result.rows,
        result.is_cache_hit()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ouroboros_sqlcache=debug")),
        )
        .init();

    info!("=== Cache-Aside Demo ===");

    let config = CacheConfig::from_env()?;
    let store = MemoryStore::new(MemoryStoreConfig::default())?;
    let cache = QueryCache::new(SlowDatabase, store, config)?;

    info!(
        "Key for this query: {}",
        cache.key_for("select 1+?", &[json!(2)], &QueryOptions::default())
    );

    info!("\n--- Policies ---");
    timed(&cache, "miss", &QueryOptions::default()).await?;
    timed(&cache, "hit", &QueryOptions::default()).await?;
    timed(&cache, "refresh", &QueryOptions::refresh()).await?;
    timed(&cache, "skip", &QueryOptions::skip()).await?;

    info!("\n--- Callback style ---");
    let (tx, rx) = oneshot::channel();
    cache.query_with_callback(
        "select 1+?",
        vec![json!(2)],
        QueryOptions::default(),
        move |outcome| {
            let _ = tx.send(outcome.map(|result| result.is_cache_hit()));
        },
    );
    info!("callback delivered, from_cache={}", rx.await??);

    info!("\n--- Executor errors reach the caller ---");
    match cache.query("  ", &[], &QueryOptions::default()).await {
        Ok(_) => info!("unexpected success"),
        Err(e) => info!("query failed as expected: {}", e),
    }

    info!("\n--- Stats ---");
    info!("{}", cache.stats());

    Ok(())
}
