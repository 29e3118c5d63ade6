use crate::original::OriginalUrl;
use crate::shortcode::ShortCode;
use thiserror::Error;

/// Errors raised while validating input before it reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid original url: {0}")]
    InvalidOriginalUrl(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache is not implemented")]
    NotImplemented,
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Errors returned by [`Repository`](crate::Repository) implementations.
///
/// The two not-found variants are expected outcomes, not failures: callers
/// match on them to drive get-or-create and allocation decisions.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("no original url found for short code {0}")]
    OriginalNotFound(ShortCode),
    #[error("no short code found for original url {0}")]
    ShortenedNotFound(OriginalUrl),
    #[error("short code already taken: {0}")]
    Conflict(ShortCode),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Returns `true` for either of the typed not-found outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::OriginalNotFound(_) | StorageError::ShortenedNotFound(_)
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("random source failed: {0}")]
    Entropy(String),
}

/// Errors surfaced by the [`Shortener`](crate::Shortener) boundary.
///
/// Transports map these variants onto their own status codes: `InvalidInput`
/// to a client error, the not-found variants to "not found",
/// `DeadlineExceeded` to a timeout and everything else to an internal error.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] CoreError),
    #[error("no original url found for short code {0}")]
    OriginalNotFound(ShortCode),
    #[error("no short code found for original url {0}")]
    ShortenedNotFound(OriginalUrl),
    #[error("operation deadline exceeded")]
    DeadlineExceeded,
    #[error("short code generation failed: {0}")]
    Generator(#[from] GeneratorError),
    #[error("{operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: StorageError,
    },
}

impl ShortenerError {
    /// Converts a repository error, passing not-found outcomes through
    /// unchanged and wrapping everything else with the failed operation.
    pub fn storage(operation: &'static str, source: StorageError) -> Self {
        match source {
            StorageError::OriginalNotFound(code) => ShortenerError::OriginalNotFound(code),
            StorageError::ShortenedNotFound(url) => ShortenerError::ShortenedNotFound(url),
            source => ShortenerError::Storage { operation, source },
        }
    }
}
