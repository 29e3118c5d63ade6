use async_trait::async_trait;
use burrow_core::cache::Result;
use burrow_core::{Cache, CacheError};
use std::time::Duration;

/// The cache used when caching is disabled.
///
/// Every call fails with [`CacheError::NotImplemented`], which sends each read
/// of the cache-aside repository to durable storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<()> {
        Err(CacheError::NotImplemented)
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(CacheError::NotImplemented)
    }

    async fn delete(&self, _keys: &[&str]) -> Result<()> {
        Err(CacheError::NotImplemented)
    }
}
