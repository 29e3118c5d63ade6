//! Cache backends for the Burrow repositories.
//!
//! All backends implement [`burrow_core::Cache`]. None of them is
//! authoritative: the cache-aside repository falls back to durable storage on
//! any miss or error.

pub mod layered;
pub mod moka;
pub mod noop;
pub mod redis;

pub use self::layered::LayeredCache;
pub use self::moka::{MokaCache, MokaCacheConfig};
pub use self::noop::NoopCache;
pub use self::redis::RedisCache;
