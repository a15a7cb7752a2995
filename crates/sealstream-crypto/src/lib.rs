//! Sealstream Cryptographic Core
//!
//! Authenticated encryption of an unbounded sequence of chunks under a single
//! key. A producer holds an [`Encryptor`], a consumer holds the matching
//! [`Decryptor`], and every chunk advances both sides by exactly one step.
//!
//! # Stream Lifecycle
//!
//! ```text
//! Key (32 bytes, external)
//!        │
//!        ▼
//! init_push ──► Header (24 bytes, random, non-secret) ──► consumer
//!        │                                                   │
//!        ▼                                                   ▼
//! Encryptor ── push(m, tag) ──► ciphertext ──► pull ── Decryptor
//!        │                                                   │
//!        ▼                                                   ▼
//! subkey + nonce advance                     subkey + nonce advance
//! ```
//!
//! The construction is byte-compatible with libsodium's
//! `crypto_secretstream_xchacha20poly1305`: HChaCha20 derives a per-stream
//! subkey from the key and header, ChaCha20-IETF encrypts each chunk, and a
//! fresh Poly1305 key authenticates the ciphertext together with an encrypted
//! tag byte. The MAC of every chunk is folded into the nonce, so each chunk is
//! chained to all chunks before it.
//!
//! # Security
//!
//! Ordering:
//! - The Nth `pull` only verifies the ciphertext of the Nth `push`
//! - Reordered, duplicated, dropped or spliced chunks fail authentication
//! - A stream without a [`Tag::Final`] chunk is visibly truncated
//!
//! Failure handling:
//! - Verification happens before decryption; no plaintext is released on
//!   failure
//! - Any failure aborts the decryptor permanently; there is no
//!   resynchronisation
//!
//! Forward secrecy:
//! - [`Tag::Rekey`] chunks and [`Encryptor::rekey`] replace the subkey with a
//!   value the old subkey cannot be recovered from
//! - Subkeys are zeroized on rekey, finalization, abort and drop

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod entropy;
pub mod error;
pub mod keys;
pub mod stream;
pub mod tag;

pub use entropy::{EntropySource, OsEntropy};
pub use error::{AuthFailure, StreamError};
pub use keys::{HEADER_LEN, Header, KEY_LEN, Key};
pub use stream::{
    ABYTES, Decryptor, Encryptor, MESSAGE_MAX, PullState, ciphertext_len, plaintext_len,
};
pub use tag::{Chunk, Tag};
