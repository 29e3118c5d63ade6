use crate::error::StorageError;
use crate::original::OriginalUrl;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// The storage boundary consumed by the shortener service.
///
/// A repository holds the bijective mapping between original URLs and short
/// codes. Lookups report absence through the typed not-found variants of
/// [`StorageError`] so that callers can tell "missing" apart from "broken".
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Commits `candidate` as the short code for `original`, unless a code is
    /// already stored for it.
    ///
    /// Returns the code that is stored once the call completes: `candidate`
    /// when this call won, or the previously committed code otherwise. The
    /// decision must be atomic so that concurrent callers for the same
    /// original converge on one code.
    ///
    /// Returns `Err(Conflict)` if `candidate` is already bound to a different
    /// original.
    async fn create_or_get_shortened(
        &self,
        original: &OriginalUrl,
        candidate: &ShortCode,
    ) -> Result<ShortCode>;

    /// Retrieves the original URL for a short code.
    /// Returns `Err(OriginalNotFound)` if the code was never issued.
    async fn get_original_by_shortened(&self, code: &ShortCode) -> Result<OriginalUrl>;

    /// Retrieves the short code for an original URL.
    /// Returns `Err(ShortenedNotFound)` if the original was never shortened.
    async fn get_shortened_by_original(&self, original: &OriginalUrl) -> Result<ShortCode>;
}

#[async_trait]
impl<T: Repository + ?Sized> Repository for Arc<T> {
    async fn create_or_get_shortened(
        &self,
        original: &OriginalUrl,
        candidate: &ShortCode,
    ) -> Result<ShortCode> {
        (**self).create_or_get_shortened(original, candidate).await
    }

    async fn get_original_by_shortened(&self, code: &ShortCode) -> Result<OriginalUrl> {
        (**self).get_original_by_shortened(code).await
    }

    async fn get_shortened_by_original(&self, original: &OriginalUrl) -> Result<ShortCode> {
        (**self).get_shortened_by_original(original).await
    }
}
