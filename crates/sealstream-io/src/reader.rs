//! Decrypting reader

use std::{
    fmt,
    io::{self, Read},
};

use bytes::{Buf, Bytes};
use sealstream_crypto::{Chunk, Decryptor, HEADER_LEN, Key, PullState, StreamError};

use crate::{
    config::FrameConfig,
    error::FrameError,
    frame::{read_frame, read_full},
};

/// Verifies and decrypts a framed stream.
///
/// Chunks are only released after they verify, but a stream is only known
/// to be complete once the final chunk arrives. Consumers that act on
/// plaintext before [`next_chunk`](Self::next_chunk) returns `None` must be
/// prepared to roll back on a later error.
pub struct StreamReader<R: Read> {
    inner: R,
    decryptor: Decryptor,
    config: FrameConfig,
    pending: Bytes,
    plaintext_read: u64,
}

impl<R: Read> StreamReader<R> {
    /// Read the stream header from `inner` and prepare to decrypt under
    /// `key`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `config` fails validation
    /// - `Truncated` if input ends inside the header
    /// - `Io` if reading fails
    pub fn new(mut inner: R, key: &Key, config: FrameConfig) -> Result<Self, FrameError> {
        config.validate()?;

        let mut header = [0u8; HEADER_LEN];
        if read_full(&mut inner, &mut header)? < HEADER_LEN {
            return Err(FrameError::Truncated);
        }
        let decryptor = Decryptor::init_pull(key, &header)?;

        Ok(Self { inner, decryptor, config, pending: Bytes::new(), plaintext_read: 0 })
    }

    /// Verify and decrypt the next chunk.
    ///
    /// Returns `None` once the final chunk has been returned.
    ///
    /// Any error is terminal: frame boundaries are lost once a frame has
    /// been partly consumed, so the reader aborts and every later call
    /// returns `Stream(Aborted)`.
    ///
    /// # Errors
    ///
    /// - `Truncated` if input ends before the final chunk
    /// - `FrameTooLarge` if a length prefix exceeds `max_frame_len`
    /// - `Stream` if a chunk fails verification
    /// - `Io` if reading fails
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, FrameError> {
        match self.decryptor.state() {
            PullState::Streaming => {},
            PullState::Finished => return Ok(None),
            PullState::Aborted => return Err(StreamError::Aborted.into()),
        }

        let frame = match read_frame(&mut self.inner, self.config.max_frame_len) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                let chunks = self.decryptor.chunks_pulled();
                tracing::warn!(chunks, "stream ended before final chunk");
                self.decryptor.abort();
                return Err(FrameError::Truncated);
            },
            Err(err) => {
                tracing::warn!(%err, "frame rejected");
                self.decryptor.abort();
                return Err(err);
            },
        };

        let chunk = self.decryptor.pull(&frame)?;
        self.plaintext_read += chunk.data().len() as u64;
        Ok(Some(chunk))
    }

    /// Consume the rest of the stream and check nothing follows the final
    /// chunk.
    ///
    /// Unread chunks are verified and discarded.
    ///
    /// # Errors
    ///
    /// - `TrailingData` if bytes follow the final chunk
    /// - any error [`next_chunk`](Self::next_chunk) can return
    pub fn finish(mut self) -> Result<R, FrameError> {
        while self.next_chunk()?.is_some() {}

        let mut next = [0u8; 1];
        if read_full(&mut self.inner, &mut next)? != 0 {
            tracing::warn!("data after final chunk");
            return Err(FrameError::TrailingData);
        }

        tracing::debug!(
            chunks = self.decryptor.chunks_pulled(),
            bytes = self.plaintext_read,
            "stream reader finished"
        );
        Ok(self.inner)
    }

    /// Lifecycle of the underlying decryptor.
    pub fn state(&self) -> PullState {
        self.decryptor.state()
    }

    /// Plaintext bytes verified so far.
    pub fn plaintext_read(&self) -> u64 {
        self.plaintext_read
    }
}

impl<R: Read> Read for StreamReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pending.is_empty() {
            match self.next_chunk()? {
                Some(chunk) => self.pending = Bytes::from(chunk.into_data()),
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }
}

impl<R: Read> fmt::Debug for StreamReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamReader")
            .field("decryptor", &self.decryptor)
            .field("pending", &self.pending.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
