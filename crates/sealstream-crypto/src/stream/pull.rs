//! Consumer side of a stream

use std::fmt;

use zeroize::Zeroize;

use super::primitive::CipherState;
use crate::{
    error::{AuthFailure, StreamError},
    keys::{Header, Key},
    tag::{Chunk, Tag},
};

/// Lifecycle of a [`Decryptor`].
///
/// ```text
/// Streaming ──► Finished   (Final chunk verified)
///     │
///     └───────► Aborted    (any failure, or a pull after Finished)
/// ```
///
/// Both terminal states are permanent and the subkey is erased on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullState {
    /// Accepting chunks
    Streaming,
    /// A [`Tag::Final`] chunk has been verified
    Finished,
    /// A chunk failed verification or the stream was misused
    Aborted,
}

/// Consumer-side stream state.
///
/// Chunks must be pulled in exactly the order they were pushed. The state
/// only advances when a chunk verifies; the first failure aborts the stream
/// permanently and no later chunk can be decrypted.
pub struct Decryptor {
    state: CipherState,
    status: PullState,
    chunks_pulled: u64,
}

impl Decryptor {
    /// Start consuming a stream from the raw header bytes.
    ///
    /// Only the header length can be checked here. A header from another
    /// stream (or a wrong key) is indistinguishable from a valid one until
    /// the first [`pull`](Self::pull) fails authentication.
    ///
    /// # Errors
    ///
    /// - `InvalidHeader` if `header` is not exactly [`crate::HEADER_LEN`]
    ///   bytes
    pub fn init_pull(key: &Key, header: &[u8]) -> Result<Self, StreamError> {
        let header = Header::from_slice(header)?;
        Ok(Self::from_header(key, &header))
    }

    /// Start consuming a stream from an already parsed header.
    pub fn from_header(key: &Key, header: &Header) -> Self {
        tracing::debug!(%header, "pull stream initialized");
        Self {
            state: CipherState::new(key, header),
            status: PullState::Streaming,
            chunks_pulled: 0,
        }
    }

    /// Verify and decrypt the next chunk.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` if the chunk is truncated, forged, out of
    ///   order or carries an unknown tag; the stream is aborted
    /// - `Finalized` if the [`Tag::Final`] chunk was already pulled; the
    ///   stream is aborted
    /// - `Aborted` if an earlier pull failed
    pub fn pull(&mut self, ciphertext: &[u8]) -> Result<Chunk, StreamError> {
        self.pull_with_ad(ciphertext, &[])
    }

    /// Verify and decrypt the next chunk against additional data `ad`.
    ///
    /// `ad` must be byte-identical to what the producer passed to
    /// [`crate::Encryptor::push_with_ad`].
    ///
    /// # Errors
    ///
    /// See [`pull`](Self::pull).
    pub fn pull_with_ad(&mut self, ciphertext: &[u8], ad: &[u8]) -> Result<Chunk, StreamError> {
        match self.status {
            PullState::Streaming => {},
            PullState::Finished => {
                tracing::warn!(chunks = self.chunks_pulled, "pull after final chunk");
                self.abort();
                return Err(StreamError::Finalized);
            },
            PullState::Aborted => return Err(StreamError::Aborted),
        }

        let (mut data, byte) = match self.state.open(ciphertext, ad) {
            Ok(opened) => opened,
            Err(reason) => {
                tracing::warn!(%reason, index = self.chunks_pulled, "chunk rejected");
                self.abort();
                return Err(reason.into());
            },
        };

        let Some(tag) = Tag::from_byte(byte) else {
            data.zeroize();
            let reason = AuthFailure::UnknownTag(byte);
            tracing::warn!(%reason, index = self.chunks_pulled, "chunk rejected");
            self.abort();
            return Err(reason.into());
        };

        let index = self.chunks_pulled;
        self.chunks_pulled += 1;
        tracing::trace!(index, ?tag, len = data.len(), "pulled chunk");

        if tag == Tag::Final {
            self.status = PullState::Finished;
            self.state.wipe();
            tracing::debug!(chunks = self.chunks_pulled, "pull stream finished");
        }

        Ok(Chunk::new(data, tag))
    }

    /// Replace the subkey without consuming a chunk.
    ///
    /// Must mirror an [`crate::Encryptor::rekey`] call made at the same
    /// position in the stream.
    ///
    /// # Errors
    ///
    /// - `Finalized` if the stream already finished
    /// - `Aborted` if an earlier pull failed
    pub fn rekey(&mut self) -> Result<(), StreamError> {
        match self.status {
            PullState::Streaming => {
                self.state.rekey();
                tracing::debug!(after_chunk = self.chunks_pulled, "pull stream rekeyed");
                Ok(())
            },
            PullState::Finished => Err(StreamError::Finalized),
            PullState::Aborted => Err(StreamError::Aborted),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PullState {
        self.status
    }

    /// True once the [`Tag::Final`] chunk has been verified.
    pub fn is_finished(&self) -> bool {
        self.status == PullState::Finished
    }

    /// Number of chunks successfully verified.
    pub fn chunks_pulled(&self) -> u64 {
        self.chunks_pulled
    }

    /// Give up on the stream: moves to [`PullState::Aborted`] and erases the
    /// subkey.
    ///
    /// For callers whose transport failed in a way that leaves the chunk
    /// sequence unknown.
    pub fn abort(&mut self) {
        self.status = PullState::Aborted;
        self.state.wipe();
    }
}

impl fmt::Debug for Decryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decryptor")
            .field("state", &self.status)
            .field("chunks_pulled", &self.chunks_pulled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Encryptor, entropy::EntropySource};

    struct FixedEntropy;

    impl EntropySource for FixedEntropy {
        fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), StreamError> {
            buffer.fill(0x11);
            Ok(())
        }
    }

    fn test_key() -> Key {
        Key::from_bytes([0x24; 32])
    }

    fn pair() -> (Encryptor, Decryptor) {
        let key = test_key();
        let (encryptor, header) = Encryptor::init_push_with(&key, &FixedEntropy).unwrap();
        let decryptor = Decryptor::from_header(&key, &header);
        (encryptor, decryptor)
    }

    #[test]
    fn init_pull_checks_header_length() {
        let key = test_key();
        assert!(Decryptor::init_pull(&key, &[0u8; 24]).is_ok());
        assert!(matches!(
            Decryptor::init_pull(&key, &[0u8; 23]),
            Err(StreamError::InvalidHeader { expected: 24, actual: 23 })
        ));
    }

    #[test]
    fn pulls_chunks_in_order() {
        let (mut encryptor, mut decryptor) = pair();

        let first = encryptor.push_message(b"one").unwrap();
        let second = encryptor.push_end(b"two").unwrap();
        let third = encryptor.push_final(b"three").unwrap();

        let chunk = decryptor.pull(&first).unwrap();
        assert_eq!((chunk.data(), chunk.tag()), (&b"one"[..], Tag::Message));

        let chunk = decryptor.pull(&second).unwrap();
        assert_eq!((chunk.data(), chunk.tag()), (&b"two"[..], Tag::Push));

        let chunk = decryptor.pull(&third).unwrap();
        assert!(chunk.is_final());
        assert_eq!(chunk.into_data(), b"three");

        assert_eq!(decryptor.state(), PullState::Finished);
        assert_eq!(decryptor.chunks_pulled(), 3);
    }

    #[test]
    fn out_of_order_chunk_aborts() {
        let (mut encryptor, mut decryptor) = pair();

        let first = encryptor.push_message(b"one").unwrap();
        let second = encryptor.push_message(b"two").unwrap();

        let err = decryptor.pull(&second).unwrap_err();
        assert_eq!(err, StreamError::AuthenticationFailed(AuthFailure::TagMismatch));
        assert_eq!(decryptor.state(), PullState::Aborted);

        // The right chunk no longer helps
        assert_eq!(decryptor.pull(&first), Err(StreamError::Aborted));
    }

    #[test]
    fn explicit_abort_is_terminal() {
        let (mut encryptor, mut decryptor) = pair();
        let chunk = encryptor.push_message(b"never read").unwrap();

        decryptor.abort();
        assert_eq!(decryptor.state(), PullState::Aborted);
        assert_eq!(decryptor.pull(&chunk), Err(StreamError::Aborted));
        assert_eq!(decryptor.rekey(), Err(StreamError::Aborted));
    }

    #[test]
    fn truncated_chunk_aborts() {
        let (_, mut decryptor) = pair();

        let err = decryptor.pull(&[0u8; 16]).unwrap_err();
        assert_eq!(
            err,
            StreamError::AuthenticationFailed(AuthFailure::Truncated { len: 16, min: 17 })
        );
        assert_eq!(decryptor.state(), PullState::Aborted);
    }

    #[test]
    fn pull_after_final_aborts() {
        let (mut encryptor, mut decryptor) = pair();

        let last = encryptor.push_final(b"").unwrap();
        decryptor.pull(&last).unwrap();

        assert_eq!(decryptor.pull(&last), Err(StreamError::Finalized));
        assert_eq!(decryptor.state(), PullState::Aborted);
        assert_eq!(decryptor.pull(&last), Err(StreamError::Aborted));
    }

    #[test]
    fn failed_pull_does_not_count() {
        let (mut encryptor, mut decryptor) = pair();

        let mut chunk = encryptor.push_message(b"payload").unwrap();
        chunk[0] ^= 0x80;

        assert!(decryptor.pull(&chunk).unwrap_err().is_auth_failure());
        assert_eq!(decryptor.chunks_pulled(), 0);
    }

    #[test]
    fn unknown_tag_aborts_after_verification() {
        let key = test_key();
        let (_, header) = Encryptor::init_push_with(&key, &FixedEntropy).unwrap();
        let mut forger = CipherState::new(&key, &header);
        let chunk = forger.seal(b"odd", b"", 0x07);

        let mut decryptor = Decryptor::from_header(&key, &header);
        assert_eq!(
            decryptor.pull(&chunk),
            Err(StreamError::AuthenticationFailed(AuthFailure::UnknownTag(0x07)))
        );
        assert_eq!(decryptor.state(), PullState::Aborted);
        assert_eq!(decryptor.chunks_pulled(), 0);
    }

    #[test]
    fn rekey_in_terminal_states() {
        let (mut encryptor, mut decryptor) = pair();

        decryptor.rekey().unwrap();
        encryptor.rekey().unwrap();

        let last = encryptor.push_final(b"done").unwrap();
        decryptor.pull(&last).unwrap();
        assert_eq!(decryptor.rekey(), Err(StreamError::Finalized));

        let (_, mut aborted) = pair();
        let _ = aborted.pull(b"garbage that will not verify");
        assert_eq!(aborted.rekey(), Err(StreamError::Aborted));
    }

    #[test]
    fn debug_shows_lifecycle_only() {
        let (_, decryptor) = pair();
        let rendered = format!("{decryptor:?}");
        assert!(rendered.contains("Streaming"));
        assert!(rendered.contains("chunks_pulled: 0"));
    }
}
