//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the shared model (short codes, original URLs, the
//! error taxonomy) and the seams between the engine's components: the
//! [`Repository`] storage boundary, the [`Cache`] boundary used by the
//! durable repositories and the [`Shortener`] boundary consumed by transports.

pub mod cache;
pub mod error;
pub mod original;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use cache::Cache;
pub use error::{CacheError, CoreError, GeneratorError, ShortenerError, StorageError};
pub use original::OriginalUrl;
pub use repository::Repository;
pub use shortcode::ShortCode;
pub use shortener::Shortener;
