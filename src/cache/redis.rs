//! Redis-backed cache store
//!
//! Values are written with `SET key value EX ttl` and read with `GET`, so
//! expiry is enforced by Redis itself.

use crate::cache::store::CacheStore;
use crate::cache::types::CacheValue;
use crate::error::{CacheError, Error, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::fmt;
use tracing::info;

/// [`CacheStore`] over a multiplexed, auto-reconnecting Redis connection
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    /// Connect to `redis_url` (e.g. `redis://127.0.0.1:6379`)
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::ConfigError(format!("invalid redis url: {}", e)))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Cache(map_redis_error(e)))?;

        info!("Connected redis cache store");
        Ok(Self { connection })
    }

    /// Wrap an existing connection manager
    pub fn from_connection(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

fn map_redis_error(e: redis::RedisError) -> CacheError {
    if e.is_timeout()
        || e.is_connection_refusal()
        || e.is_connection_dropped()
        || e.is_io_error()
    {
        CacheError::ConnectionError(e.to_string())
    } else {
        CacheError::Backend(e.to_string())
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> std::result::Result<Option<CacheValue>, CacheError> {
        let mut connection = self.connection.clone();
        let value: Option<String> = connection.get(key).await.map_err(map_redis_error)?;
        Ok(value)
    }

    async fn set(
        &self,
        key: &str,
        value: CacheValue,
        ttl_seconds: u64,
    ) -> std::result::Result<(), CacheError> {
        if ttl_seconds == 0 {
            return Err(CacheError::Rejected(
                "redis requires an expiry of at least one second".to_string(),
            ));
        }

        let mut connection = self.connection.clone();
        let _: () = connection
            .set_ex(key, value, ttl_seconds)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
