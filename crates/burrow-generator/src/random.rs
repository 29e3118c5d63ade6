use crate::Generator;
use burrow_core::shortcode::{ALPHABET, LENGTH};
use burrow_core::{GeneratorError, ShortCode};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

// Largest multiple of the alphabet size that fits in a byte. Bytes at or above
// it are rejected so every symbol stays equally likely.
const ACCEPT_BELOW: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Draws short codes uniformly from the alphabet using a cryptographically
/// secure random source.
///
/// The random source is injected so that tests can substitute a seeded
/// CSPRNG (e.g. `StdRng::seed_from_u64`) and get reproducible codes. The
/// `CryptoRng` bound keeps statistical-only generators out: codes must be
/// unpredictable, and uncoordinated instances must not produce correlated
/// sequences.
#[derive(Debug)]
pub struct RandomGenerator<R = OsRng> {
    rng: Mutex<R>,
}

impl RandomGenerator<OsRng> {
    /// Creates a generator backed by the operating system's entropy source.
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl Default for RandomGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> RandomGenerator<R> {
    /// Creates a generator drawing from the given random source.
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Draws the next code.
    pub fn next_code(&self) -> Result<ShortCode, GeneratorError> {
        let mut code = String::with_capacity(LENGTH);
        let mut buf = [0u8; LENGTH * 2];
        let mut rng = self.rng.lock();

        while code.len() < LENGTH {
            rng.try_fill_bytes(&mut buf)
                .map_err(|e| GeneratorError::Entropy(e.to_string()))?;

            let accepted = buf.iter().filter(|byte| **byte < ACCEPT_BELOW);
            for byte in accepted.take(LENGTH - code.len()) {
                code.push(ALPHABET[(*byte as usize) % ALPHABET.len()] as char);
            }
        }

        Ok(ShortCode::new_unchecked(code))
    }
}

impl<R: RngCore + CryptoRng + Send + 'static> Generator for RandomGenerator<R> {
    type Output = ShortCode;

    fn generate(&self) -> Result<Self::Output, GeneratorError> {
        self.next_code()
    }
}
