pub mod random;

use burrow_core::{GeneratorError, ShortCode};

pub use random::RandomGenerator;

/// Trait for generating short code candidates.
///
/// Implementations are pure generators that don't interact with storage:
/// uniqueness is checked afterwards by the allocator against the repository.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;

    /// Draws the next candidate.
    fn generate(&self) -> Result<Self::Output, GeneratorError>;
}

impl<G: Generator + ?Sized> Generator for std::sync::Arc<G> {
    type Output = G::Output;

    fn generate(&self) -> Result<Self::Output, GeneratorError> {
        (**self).generate()
    }
}
