//! Disposable container fixtures for Burrow integration tests.
//!
//! Every fixture owns its container; dropping the fixture stops it.

mod error;
pub mod postgres;
pub mod redis;

pub use error::{Result, TestInfraError};
