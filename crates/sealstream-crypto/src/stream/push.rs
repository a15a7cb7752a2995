//! Producer side of a stream

use std::fmt;

use super::{MESSAGE_MAX, primitive::CipherState};
use crate::{
    entropy::{EntropySource, OsEntropy},
    error::StreamError,
    keys::{HEADER_LEN, Header, Key},
    tag::Tag,
};

/// Producer-side stream state.
///
/// Each [`push`](Self::push) call:
/// 1. Encrypts and authenticates one chunk together with its [`Tag`]
/// 2. Folds the chunk MAC into the running nonce
/// 3. Replaces the subkey if the tag requests it
///
/// Identical plaintexts pushed twice produce different ciphertexts, because
/// the state moved in between.
///
/// # Invariants
///
/// - Exactly one `Encryptor` exists per stream; it is neither `Clone` nor
///   `Copy`
/// - After a [`Tag::Final`] chunk every further operation returns
///   [`StreamError::Finalized`] and the subkey is erased
/// - `&mut self` on every operation: concurrent pushes are ruled out by the
///   borrow checker, not by locking
pub struct Encryptor {
    state: CipherState,
    finalized: bool,
    chunks_pushed: u64,
}

impl Encryptor {
    /// Start a stream under `key` with an OS-random header.
    ///
    /// Returns the encryptor and the [`Header`] the consumer needs for
    /// [`crate::Decryptor::init_pull`].
    ///
    /// # Errors
    ///
    /// - `EntropyUnavailable` if the OS RNG fails (fatal)
    pub fn init_push(key: &Key) -> Result<(Self, Header), StreamError> {
        Self::init_push_with(key, &OsEntropy)
    }

    /// Start a stream with header randomness from `entropy`.
    ///
    /// # Errors
    ///
    /// - `EntropyUnavailable` if `entropy` fails (fatal)
    pub fn init_push_with<E>(key: &Key, entropy: &E) -> Result<(Self, Header), StreamError>
    where
        E: EntropySource + ?Sized,
    {
        let mut bytes = [0u8; HEADER_LEN];
        entropy.fill_bytes(&mut bytes)?;
        let header = Header::from_bytes(bytes);

        let state = CipherState::new(key, &header);
        tracing::debug!(%header, "push stream initialized");

        Ok((Self { state, finalized: false, chunks_pushed: 0 }, header))
    }

    /// Encrypt one chunk with `tag`.
    ///
    /// Output is `plaintext.len() + ABYTES` bytes.
    ///
    /// # Errors
    ///
    /// - `Finalized` if a [`Tag::Final`] chunk was already pushed
    /// - `MessageTooLong` if `plaintext` exceeds [`MESSAGE_MAX`]
    pub fn push(&mut self, plaintext: &[u8], tag: Tag) -> Result<Vec<u8>, StreamError> {
        self.push_with_ad(plaintext, &[], tag)
    }

    /// Encrypt one chunk with `tag`, also authenticating `ad`.
    ///
    /// `ad` is not part of the output; the consumer must supply the same
    /// bytes to [`crate::Decryptor::pull_with_ad`].
    ///
    /// # Errors
    ///
    /// - `Finalized` if a [`Tag::Final`] chunk was already pushed
    /// - `MessageTooLong` if `plaintext` exceeds [`MESSAGE_MAX`]
    pub fn push_with_ad(
        &mut self,
        plaintext: &[u8],
        ad: &[u8],
        tag: Tag,
    ) -> Result<Vec<u8>, StreamError> {
        if self.finalized {
            return Err(StreamError::Finalized);
        }

        let len = plaintext.len() as u64;
        if len > MESSAGE_MAX {
            return Err(StreamError::MessageTooLong { len, max: MESSAGE_MAX });
        }

        let ciphertext = self.state.seal(plaintext, ad, tag.to_byte());

        let index = self.chunks_pushed;
        self.chunks_pushed += 1;
        tracing::trace!(index, ?tag, len = plaintext.len(), "pushed chunk");

        if tag == Tag::Final {
            self.finalized = true;
            self.state.wipe();
            tracing::debug!(chunks = self.chunks_pushed, "push stream finalized");
        }

        Ok(ciphertext)
    }

    /// Push an ordinary chunk ([`Tag::Message`]).
    ///
    /// # Errors
    ///
    /// See [`push`](Self::push).
    pub fn push_message(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, StreamError> {
        self.push(plaintext, Tag::Message)
    }

    /// Push a chunk closing a sub-message ([`Tag::Push`]).
    ///
    /// # Errors
    ///
    /// See [`push`](Self::push).
    pub fn push_end(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, StreamError> {
        self.push(plaintext, Tag::Push)
    }

    /// Push a chunk and replace the subkey afterwards ([`Tag::Rekey`]).
    ///
    /// # Errors
    ///
    /// See [`push`](Self::push).
    pub fn push_rekey(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, StreamError> {
        self.push(plaintext, Tag::Rekey)
    }

    /// Push the last chunk of the stream ([`Tag::Final`]).
    ///
    /// # Errors
    ///
    /// See [`push`](Self::push).
    pub fn push_final(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, StreamError> {
        self.push(plaintext, Tag::Final)
    }

    /// Replace the subkey without emitting a chunk.
    ///
    /// The consumer must call [`crate::Decryptor::rekey`] after pulling the
    /// same number of chunks, or every later chunk fails authentication.
    ///
    /// # Errors
    ///
    /// - `Finalized` if a [`Tag::Final`] chunk was already pushed
    pub fn rekey(&mut self) -> Result<(), StreamError> {
        if self.finalized {
            return Err(StreamError::Finalized);
        }

        self.state.rekey();
        tracing::debug!(after_chunk = self.chunks_pushed, "push stream rekeyed");
        Ok(())
    }

    /// True once a [`Tag::Final`] chunk has been pushed.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of chunks produced so far.
    pub fn chunks_pushed(&self) -> u64 {
        self.chunks_pushed
    }
}

impl fmt::Debug for Encryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encryptor")
            .field("finalized", &self.finalized)
            .field("chunks_pushed", &self.chunks_pushed)
            .finish_non_exhaustive()
    }
}
