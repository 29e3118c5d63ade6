//! The Burrow shortening engine.
//!
//! [`ShortenerService`] implements [`Shortener`] on top of any
//! [`Repository`](burrow_core::Repository): get-or-create `shorten` and
//! lookup `resolve`, each under a deadline. The [`Allocator`] turns random
//! candidates into unused short codes.

pub mod allocator;
pub mod service;

pub use allocator::Allocator;
pub use burrow_core::Shortener;
pub use service::{ServiceSettings, ShortenerService};
