use async_trait::async_trait;
use burrow_core::cache::Result;
use burrow_core::Cache;
use moka::future::Cache as MokaStore;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Option<Duration>,
}

/// Expires every entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// An in-process cache backed by Moka.
///
/// Suited to single-node deployments, or as the L1 of a
/// [`LayeredCache`](crate::LayeredCache) in front of Redis. Capacity is bounded
/// and every entry carries its own TTL; writes without a TTL fall back to the
/// configured default, and live until evicted if there is none.
#[derive(Debug, Clone)]
pub struct MokaCache {
    store: MokaStore<String, Entry>,
    default_ttl: Option<Duration>,
}

impl MokaCache {
    /// Creates a cache holding up to 10,000 entries with no default TTL.
    pub fn new() -> Self {
        MokaCacheConfig::default().into()
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        MokaCacheConfig::builder()
            .max_capacity(max_capacity)
            .build()
            .into()
    }

    /// Returns a builder for creating a custom cache configuration.
    pub fn builder() -> MokaCacheConfigBuilder {
        MokaCacheConfig::builder()
    }
}

impl Default for MokaCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MokaCache {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        trace!(key, "Storing value in Moka cache");

        let entry = Entry {
            value: value.to_string(),
            ttl: ttl.or(self.default_ttl),
        };
        self.store.insert(key.to_string(), entry).await;
        debug!(key, "Cached value in Moka");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.store.get(key).await {
            Some(entry) => {
                debug!(key, "Cache hit in Moka");
                Ok(Some(entry.value))
            }
            None => {
                trace!(key, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn delete(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.store.invalidate(*key).await;
        }
        trace!(count = keys.len(), "Removed values from Moka cache (if present)");
        Ok(())
    }
}

/// Configuration for creating a [`MokaCache`] with custom settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MokaCacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default = DEFAULT_MAX_CAPACITY)]
    max_capacity: u64,
    /// TTL applied to writes that do not carry their own.
    #[builder(default, setter(strip_option))]
    default_ttl: Option<Duration>,
}

impl Default for MokaCacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<MokaCacheConfig> for MokaCache {
    fn from(config: MokaCacheConfig) -> Self {
        let store = MokaStore::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        MokaCache {
            store,
            default_ttl: config.default_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cache_get_and_set() {
        let cache = MokaCache::new();

        assert_eq!(cache.get("code:Ab12Cd34_9").await.unwrap(), None);

        cache
            .set("code:Ab12Cd34_9", "https://example.com/a", None)
            .await
            .unwrap();

        assert_eq!(
            cache.get("code:Ab12Cd34_9").await.unwrap().as_deref(),
            Some("https://example.com/a")
        );
    }

    #[tokio::test]
    async fn set_overwrites_value() {
        let cache = MokaCache::new();

        cache.set("key", "first", None).await.unwrap();
        cache.set("key", "second", None).await.unwrap();

        assert_eq!(cache.get("key").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn delete_removes_every_key() {
        let cache = MokaCache::new();
        cache.set("a", "1", None).await.unwrap();
        cache.set("b", "2", None).await.unwrap();
        cache.set("c", "3", None).await.unwrap();

        cache.delete(&["a", "b", "missing"]).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), None);
        assert_eq!(cache.get("b").await.unwrap(), None);
        assert_eq!(cache.get("c").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn entry_ttl_expires() {
        let cache = MokaCache::new();

        cache
            .set("short", "value", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        cache.set("long", "value", None).await.unwrap();
        assert!(cache.get("short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert!(cache.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn default_ttl_applies_without_entry_ttl() {
        let cache: MokaCache = MokaCache::builder()
            .max_capacity(100)
            .default_ttl(Duration::from_millis(50))
            .build()
            .into();

        cache.set("key", "value", None).await.unwrap();
        cache
            .set("pinned", "value", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.get("key").await.unwrap(), None);
        assert!(cache.get("pinned").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn handles_many_entries() {
        let cache = MokaCache::with_capacity(100);

        for i in 0..50 {
            cache
                .set(&format!("code{i}"), &format!("https://example{i}.com"), None)
                .await
                .unwrap();
        }

        assert_eq!(
            cache.get("code0").await.unwrap().as_deref(),
            Some("https://example0.com")
        );
        assert_eq!(
            cache.get("code49").await.unwrap().as_deref(),
            Some("https://example49.com")
        );
    }
}
