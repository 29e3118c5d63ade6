//! Repository implementations for the Burrow shortener.
//!
//! - [`InMemoryRepository`]: non-durable, over a partitioned concurrent map.
//! - [`PostgresRepository`] and [`SqliteRepository`]: durable, with an atomic
//!   upsert on the original link.
//! - [`CachedRepository`]: a cache-aside decorator for any repository.

pub mod cached;
pub mod memory;
pub mod postgres;
mod sql;
pub mod sqlite;

pub use cached::{CacheSettings, CachedRepository};
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
pub use sqlite::SqliteRepository;

pub use burrow_core::repository::{Repository, Result};
pub use burrow_core::StorageError;
