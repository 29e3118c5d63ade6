use burrow_core::{Repository, ShortCode, ShortenerError, StorageError};
use burrow_generator::Generator;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Turns generated candidates into short codes that are not in use.
///
/// The repository is the uniqueness oracle: a candidate is accepted once
/// `get_original_by_shortened` reports it as not found. There is no retry
/// budget; drawing stops only when the deadline passes. The allocator never
/// writes, so an accepted code can still be taken by a concurrent commit
/// before the caller commits it.
pub struct Allocator<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
}

impl<R, G> Clone for Allocator<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<R: Repository, G: Generator> Allocator<R, G> {
    pub fn new(repository: Arc<R>, generator: Arc<G>) -> Self {
        Self {
            repository,
            generator,
        }
    }

    /// Draws candidates until one does not resolve.
    ///
    /// # Errors
    ///
    /// - `DeadlineExceeded` once `deadline` passes, including while a
    ///   lookup is in flight.
    /// - `Generator` if the random source fails.
    /// - `Storage` for any lookup failure other than not-found.
    pub async fn allocate(&self, deadline: Instant) -> Result<ShortCode, ShortenerError> {
        let mut attempts: u64 = 0;

        loop {
            if Instant::now() >= deadline {
                warn!(attempts, "Deadline exceeded while allocating a short code");
                return Err(ShortenerError::DeadlineExceeded);
            }
            attempts += 1;

            let candidate: ShortCode = self.generator.generate()?.into();
            let lookup = self.repository.get_original_by_shortened(&candidate);

            match tokio::time::timeout_at(deadline, lookup).await {
                Err(_) => {
                    warn!(attempts, "Deadline exceeded while checking a candidate");
                    return Err(ShortenerError::DeadlineExceeded);
                }
                Ok(Err(StorageError::OriginalNotFound(_))) => {
                    trace!(code = %candidate, attempts, "Allocated short code");
                    return Ok(candidate);
                }
                Ok(Ok(_)) => {
                    debug!(code = %candidate, attempts, "Short code collision, drawing again");
                    tokio::task::yield_now().await;
                }
                Ok(Err(e)) => {
                    return Err(ShortenerError::storage("check short code availability", e));
                }
            }
        }
    }
}
