use crate::error::CacheError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

/// A best-effort key/value cache in front of durable storage.
///
/// Entries are never authoritative. Every error a cache returns is recovered
/// by the caller by falling back to durable storage, so implementations may
/// fail freely (the no-op cache fails every call).
#[async_trait]
pub trait Cache: Send + Sync + 'static {
    /// Stores `value` under `key`.
    ///
    /// If `ttl` is `None`, the entry may persist indefinitely or use a
    /// default expiration policy depending on the implementation.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Fetches the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Removes every listed key. Missing keys are not an error.
    async fn delete(&self, keys: &[&str]) -> Result<()>;
}

#[async_trait]
impl<T: Cache + ?Sized> Cache for Arc<T> {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        (**self).set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn delete(&self, keys: &[&str]) -> Result<()> {
        (**self).delete(keys).await
    }
}
