use crate::allocator::Allocator;
use async_trait::async_trait;
use burrow_core::{OriginalUrl, Repository, ShortCode, Shortener, ShortenerError, StorageError};
use burrow_generator::Generator;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ServiceSettings {
    /// Deadline applied to `shorten` and `resolve` calls that do not supply
    /// their own.
    #[builder(default = Duration::from_secs(4))]
    pub operation_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the [`Shortener`] trait.
///
/// `shorten` is get-or-create: an existing mapping is returned as is,
/// otherwise the [`Allocator`] proposes an unused code and the repository
/// commits it atomically. When two callers race on the same original, the
/// repository keeps the first commit and both callers return its code.
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    allocator: Allocator<R, G>,
    settings: ServiceSettings,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            allocator: self.allocator.clone(),
            settings: self.settings,
        }
    }
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    pub fn new(repository: R, generator: G) -> Self {
        Self::with_settings(repository, generator, ServiceSettings::default())
    }

    pub fn with_settings(repository: R, generator: G, settings: ServiceSettings) -> Self {
        let repository = Arc::new(repository);
        let allocator = Allocator::new(Arc::clone(&repository), Arc::new(generator));
        Self {
            repository,
            allocator,
            settings,
        }
    }

    /// Returns a reference to the repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Like [`Shortener::shorten`], under a caller-supplied deadline.
    pub async fn shorten_before(
        &self,
        original: &OriginalUrl,
        deadline: Instant,
    ) -> Result<ShortCode, ShortenerError> {
        match tokio::time::timeout_at(deadline, self.get_or_create(original, deadline)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(original = %original, "Deadline exceeded while shortening");
                Err(ShortenerError::DeadlineExceeded)
            }
        }
    }

    /// Like [`Shortener::resolve`], under a caller-supplied deadline.
    pub async fn resolve_before(
        &self,
        code: &ShortCode,
        deadline: Instant,
    ) -> Result<OriginalUrl, ShortenerError> {
        let lookup = self.repository.get_original_by_shortened(code);

        match tokio::time::timeout_at(deadline, lookup).await {
            Ok(Ok(original)) => {
                trace!(code = %code, "Resolved short code");
                Ok(original)
            }
            Ok(Err(e)) => Err(ShortenerError::storage("resolve short code", e)),
            Err(_) => {
                warn!(code = %code, "Deadline exceeded while resolving");
                Err(ShortenerError::DeadlineExceeded)
            }
        }
    }

    async fn get_or_create(
        &self,
        original: &OriginalUrl,
        deadline: Instant,
    ) -> Result<ShortCode, ShortenerError> {
        match self.repository.get_shortened_by_original(original).await {
            Ok(code) => {
                debug!(code = %code, original = %original, "Original already shortened");
                return Ok(code);
            }
            Err(StorageError::ShortenedNotFound(_)) => {}
            Err(e) => return Err(ShortenerError::storage("look up existing short code", e)),
        }

        loop {
            let candidate = self.allocator.allocate(deadline).await?;

            match self
                .repository
                .create_or_get_shortened(original, &candidate)
                .await
            {
                Ok(code) if code == candidate => {
                    info!(code = %code, original = %original, "Created short code");
                    return Ok(code);
                }
                Ok(code) => {
                    debug!(code = %code, candidate = %candidate, "Concurrent shorten committed first");
                    return Ok(code);
                }
                // Another original committed this candidate after it was
                // checked; draw a new one.
                Err(StorageError::Conflict(code)) => {
                    debug!(code = %code, "Candidate taken at commit, allocating again");
                }
                Err(e) => return Err(ShortenerError::storage("commit short code", e)),
            }
        }
    }

    fn default_deadline(&self) -> Instant {
        Instant::now() + self.settings.operation_timeout
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, original: &OriginalUrl) -> Result<ShortCode, ShortenerError> {
        self.shorten_before(original, self.default_deadline()).await
    }

    async fn resolve(&self, code: &ShortCode) -> Result<OriginalUrl, ShortenerError> {
        self.resolve_before(code, self.default_deadline()).await
    }
}
