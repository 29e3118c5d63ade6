use async_trait::async_trait;
use burrow_core::cache::Result;
use burrow_core::{Cache, CacheError};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

const DEFAULT_KEY_PREFIX: &str = "burrow:";

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

/// A Redis-based implementation of [`Cache`].
///
/// Values are stored as plain strings under a configurable key prefix. TTLs
/// are sent with millisecond precision.
#[derive(Debug, Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisCache {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a Redis cache with a custom key prefix (e.g. `"myapp:"`).
    pub fn with_prefix(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a multiplexed connection to `url` and wraps it.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| map_redis_error("invalid Redis url", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(format!("failed to connect to Redis: {e}")))?;
        Ok(Self::new(conn))
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let redis_key = self.cache_key(key);
        trace!(key, "Storing value in Redis cache");

        let mut conn = self.conn.clone();
        let result = match ttl {
            // PX rejects zero, so sub-millisecond TTLs round up.
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                conn.pset_ex::<_, _, ()>(&redis_key, value, millis).await
            }
            None => conn.set::<_, _, ()>(&redis_key, value).await,
        };

        match result {
            Ok(()) => {
                debug!(key, "Cached value in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to cache value in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let redis_key = self.cache_key(key);
        trace!(key, "Fetching value from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&redis_key).await {
            Ok(Some(value)) => {
                debug!(key, "Cache hit in Redis");
                Ok(Some(value))
            }
            Ok(None) => {
                trace!(key, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn delete(&self, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let redis_keys: Vec<String> = keys.iter().map(|key| self.cache_key(key)).collect();
        trace!(count = redis_keys.len(), "Removing values from Redis cache");

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(redis_keys).await {
            Ok(()) => {
                debug!(count = keys.len(), "Removed values from Redis cache");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to remove values from Redis cache");
                Err(map_redis_error("failed to delete values from Redis", e))
            }
        }
    }
}

// Tests against a live server live in tests/redis_cache_integration.rs.
