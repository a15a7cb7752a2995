//! Chunked stream encryption
//!
//! # Architecture
//!
//! ```text
//! Key + Header
//!        │
//!        ▼ HChaCha20
//! CipherState { subkey, counter || inonce }
//!        │
//!        ▼ seal / open (one call per chunk)
//! tag byte + ciphertext + Poly1305 MAC
//!        │
//!        ▼ advance
//! inonce ^= MAC, counter += 1, rekey on Rekey/Final or counter wrap
//! ```
//!
//! [`Encryptor`] and [`Decryptor`] each own exactly one [`CipherState`]. Neither
//! is `Clone`: a copied state would advance independently of the original and
//! desynchronise the stream.
//!
//! [`CipherState`]: primitive::CipherState

mod primitive;
pub mod pull;
pub mod push;

pub use pull::{Decryptor, PullState};
pub use push::Encryptor;

/// Bytes added to every chunk: one encrypted tag byte and a 16-byte MAC
pub const ABYTES: usize = 1 + primitive::MAC_LEN;

/// Maximum plaintext length of a single chunk (`64 * (2^32 - 2)` bytes)
pub const MESSAGE_MAX: u64 = 64 * ((1 << 32) - 2);

/// Ciphertext length for a chunk of `plaintext_len` bytes.
pub const fn ciphertext_len(plaintext_len: usize) -> usize {
    plaintext_len + ABYTES
}

/// Plaintext length carried by a ciphertext chunk. `None` if the chunk is
/// shorter than [`ABYTES`].
pub const fn plaintext_len(ciphertext_len: usize) -> Option<usize> {
    ciphertext_len.checked_sub(ABYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overhead_is_seventeen_bytes() {
        assert_eq!(ABYTES, 17);
        assert_eq!(ciphertext_len(12), 29);
    }

    #[test]
    fn plaintext_len_rejects_short_chunks() {
        assert_eq!(plaintext_len(16), None);
        assert_eq!(plaintext_len(17), Some(0));
        assert_eq!(plaintext_len(29), Some(12));
    }

    #[test]
    fn message_max_matches_libsodium() {
        assert_eq!(MESSAGE_MAX, 274_877_906_816);
    }
}
