use crate::original::OriginalUrl;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the short code for `original`, creating one on first use.
    ///
    /// Repeated calls for the same original return the same code, including
    /// calls that race each other.
    async fn shorten(&self, original: &OriginalUrl) -> Result<ShortCode>;

    /// Resolves a short code to the original URL it was issued for.
    /// Returns `Err(OriginalNotFound)` if the code was never issued.
    async fn resolve(&self, code: &ShortCode) -> Result<OriginalUrl>;
}
