use async_trait::async_trait;
use burrow_core::repository::{Repository, Result};
use burrow_core::{Cache, CacheError, OriginalUrl, ShortCode};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

fn code_key(code: &ShortCode) -> String {
    format!("code:{code}")
}

fn url_key(original: &OriginalUrl) -> String {
    format!("url:{original}")
}

/// Tuning for [`CachedRepository`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct CacheSettings {
    /// TTL of populated entries. `None` leaves expiry to the cache backend.
    #[builder(default, setter(strip_option))]
    pub ttl: Option<Duration>,
    /// Upper bound on a cache read before falling back to storage.
    #[builder(default = Duration::from_secs(2))]
    pub read_timeout: Duration,
    /// Upper bound on a background cache population.
    #[builder(default = Duration::from_secs(3))]
    pub write_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A repository decorator that adds cache-aside reads.
///
/// Reads check the cache first and fall back to the inner repository on a
/// miss, a cache error or a cache timeout. Cache failures never fail the
/// call: the cache is never authoritative.
///
/// After a commit or a durable read hit, both directions of the mapping are
/// written to the cache from a spawned task bounded by the write timeout.
/// The cache always receives the code the store returned, which may differ
/// from the candidate that was offered. Short-lived callers can wait for
/// outstanding writes with [`CachedRepository::flush`].
///
/// Entries are keyed `code:<short code>` and `url:<original url>`.
#[derive(Debug, Clone)]
pub struct CachedRepository<R, C> {
    inner: R,
    cache: Arc<C>,
    settings: CacheSettings,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl<R: Repository, C: Cache> CachedRepository<R, C> {
    /// Creates a new cached repository decorator with default settings.
    ///
    /// ```rust,no_run
    /// use burrow_cache::RedisCache;
    /// use burrow_storage::{CachedRepository, PostgresRepository};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let inner = PostgresRepository::connect("postgres://localhost/burrow").await?;
    /// let cache = RedisCache::connect("redis://127.0.0.1:6379").await?;
    /// let repo = CachedRepository::new(inner, cache);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(inner: R, cache: C) -> Self {
        Self::with_settings(inner, cache, CacheSettings::default())
    }

    pub fn with_settings(inner: R, cache: C, settings: CacheSettings) -> Self {
        Self {
            inner,
            cache: Arc::new(cache),
            settings,
            pending: Arc::default(),
        }
    }

    /// Returns a reference to the inner repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Returns a reference to the cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Waits for every cache population spawned so far.
    ///
    /// Each write is already bounded by the write timeout, so this returns
    /// within roughly that long.
    pub async fn flush(&self) {
        let pending = std::mem::take(&mut *self.pending.lock());
        trace!(tasks = pending.len(), "Flushing cache population");
        for handle in pending {
            if let Err(e) = handle.await {
                warn!(error = %e, "Cache population task failed");
            }
        }
    }

    async fn read_cache(&self, key: &str) -> Option<String> {
        match tokio::time::timeout(self.settings.read_timeout, self.cache.get(key)).await {
            Ok(Ok(Some(value))) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Ok(Ok(None)) => {
                trace!(key, "Cache miss");
                None
            }
            Ok(Err(CacheError::NotImplemented)) => None,
            Ok(Err(e)) => {
                warn!(key, error = %e, "Cache error, falling back to storage");
                None
            }
            Err(_) => {
                warn!(
                    key,
                    timeout_ms = self.settings.read_timeout.as_millis() as u64,
                    "Cache read timed out, falling back to storage"
                );
                None
            }
        }
    }

    fn populate(&self, original: &OriginalUrl, code: &ShortCode) {
        let cache = Arc::clone(&self.cache);
        let ttl = self.settings.ttl;
        let write_timeout = self.settings.write_timeout;
        let code_key = code_key(code);
        let url_key = url_key(original);
        let original = original.as_str().to_owned();
        let code = code.as_str().to_owned();

        let handle = tokio::spawn(async move {
            let write = async {
                cache.set(&code_key, &original, ttl).await?;
                cache.set(&url_key, &code, ttl).await
            };

            match tokio::time::timeout(write_timeout, write).await {
                Ok(Ok(())) => trace!(code = %code, "Populated cache"),
                Ok(Err(CacheError::NotImplemented)) => {}
                Ok(Err(e)) => warn!(code = %code, error = %e, "Failed to populate cache"),
                Err(_) => warn!(
                    code = %code,
                    timeout_ms = write_timeout.as_millis() as u64,
                    "Cache population timed out"
                ),
            }
        });

        let mut pending = self.pending.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}

#[async_trait]
impl<R: Repository, C: Cache> Repository for CachedRepository<R, C> {
    async fn create_or_get_shortened(
        &self,
        original: &OriginalUrl,
        candidate: &ShortCode,
    ) -> Result<ShortCode> {
        let stored = self
            .inner
            .create_or_get_shortened(original, candidate)
            .await?;
        self.populate(original, &stored);
        Ok(stored)
    }

    async fn get_original_by_shortened(&self, code: &ShortCode) -> Result<OriginalUrl> {
        if let Some(cached) = self.read_cache(&code_key(code)).await {
            match OriginalUrl::parse(&cached) {
                Ok(original) => return Ok(original),
                Err(e) => warn!(code = %code, error = %e, "Ignoring invalid cached original"),
            }
        }

        trace!(code = %code, "Fetching original from inner repository");
        let original = self.inner.get_original_by_shortened(code).await?;
        self.populate(&original, code);
        Ok(original)
    }

    async fn get_shortened_by_original(&self, original: &OriginalUrl) -> Result<ShortCode> {
        if let Some(cached) = self.read_cache(&url_key(original)).await {
            match ShortCode::new(&cached) {
                Ok(code) => return Ok(code),
                Err(e) => warn!(original = %original, error = %e, "Ignoring invalid cached code"),
            }
        }

        trace!(original = %original, "Fetching code from inner repository");
        let code = self.inner.get_shortened_by_original(original).await?;
        self.populate(original, &code);
        Ok(code)
    }
}
