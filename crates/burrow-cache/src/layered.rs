use async_trait::async_trait;
use burrow_core::cache::Result;
use burrow_core::Cache;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A two-level cache composing a fast local L1 with a shared L2.
///
/// - **Get**: L1 first. On a miss (or an L1 error) L2 is consulted, and an L2
///   hit is copied back into L1.
/// - **Set**: L2 then L1.
/// - **Delete**: L1 then L2.
///
/// ```rust
/// use burrow_cache::{LayeredCache, MokaCache};
///
/// let l1 = MokaCache::with_capacity(10_000);
/// // let l2 = RedisCache::connect("redis://127.0.0.1:6379").await?;
/// let l2 = MokaCache::with_capacity(100_000);
/// let cache = LayeredCache::new(l1, l2);
/// ```
#[derive(Debug, Clone)]
pub struct LayeredCache<L1, L2> {
    l1: L1,
    l2: L2,
    backfill_ttl: Option<Duration>,
}

impl<L1, L2> LayeredCache<L1, L2> {
    pub fn new(l1: L1, l2: L2) -> Self {
        Self {
            l1,
            l2,
            backfill_ttl: None,
        }
    }

    /// Sets the TTL of entries copied from L2 into L1. Without one, L1 applies
    /// its own default.
    pub fn with_backfill_ttl(mut self, ttl: Duration) -> Self {
        self.backfill_ttl = Some(ttl);
        self
    }

    pub fn l1(&self) -> &L1 {
        &self.l1
    }

    pub fn l2(&self) -> &L2 {
        &self.l2
    }

    /// Consumes the layered cache and returns the inner caches.
    pub fn into_inner(self) -> (L1, L2) {
        (self.l1, self.l2)
    }
}

#[async_trait]
impl<L1, L2> Cache for LayeredCache<L1, L2>
where
    L1: Cache,
    L2: Cache,
{
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        trace!(key, "Storing value in layered cache");

        self.l2.set(key, value, ttl).await?;
        self.l1.set(key, value, ttl).await?;
        debug!(key, "Stored value in L1 and L2");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.l1.get(key).await {
            Ok(Some(value)) => {
                debug!(key, "L1 cache hit");
                return Ok(Some(value));
            }
            Ok(None) => trace!(key, "L1 cache miss, trying L2"),
            Err(e) => warn!(key, error = %e, "L1 cache error, trying L2"),
        }

        match self.l2.get(key).await? {
            Some(value) => {
                debug!(key, "L2 cache hit, backfilling L1");
                if let Err(e) = self.l1.set(key, &value, self.backfill_ttl).await {
                    warn!(key, error = %e, "Failed to backfill L1");
                }
                Ok(Some(value))
            }
            None => {
                trace!(key, "L2 cache miss");
                Ok(None)
            }
        }
    }

    async fn delete(&self, keys: &[&str]) -> Result<()> {
        self.l1.delete(keys).await?;
        self.l2.delete(keys).await?;
        debug!(count = keys.len(), "Removed values from L1 and L2");
        Ok(())
    }
}
