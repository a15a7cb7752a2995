//! Randomness for stream headers.
//!
//! Header generation is the only place the stream needs randomness. Keeping it
//! behind a trait lets tests pin headers to known values while production uses
//! the OS generator.

use crate::error::StreamError;

/// Source of header randomness.
///
/// # Invariants
///
/// - Production implementations MUST be cryptographically secure
/// - A failure is reported, never papered over with weak bytes
pub trait EntropySource {
    /// Fill `buffer` completely with random bytes.
    ///
    /// # Errors
    ///
    /// - `EntropyUnavailable` if the source cannot produce randomness
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), StreamError>;
}

/// Operating system RNG (getrandom).
///
/// Uses the platform CSPRNG (e.g., `getrandom(2)` on Linux,
/// `BCryptGenRandom` on Windows). RNG failure indicates an OS-level problem
/// and surfaces as [`StreamError::EntropyUnavailable`], which callers should
/// treat as fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), StreamError> {
        getrandom::fill(buffer).map_err(|err| {
            tracing::error!(error = %err, "OS entropy source failed");
            StreamError::EntropyUnavailable { reason: err.to_string() }
        })
    }
}
