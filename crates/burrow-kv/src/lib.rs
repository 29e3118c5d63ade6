//! A sharded, lock-guarded bidirectional key/value map.
//!
//! This is the in-memory backend of the Burrow shortener. Keys are routed to
//! one of a fixed number of partitions by an FNV-1a hash; every partition owns
//! a forward map and a reverse map behind a single reader/writer lock.

mod map;
mod partition;

pub use map::PartitionedMap;
