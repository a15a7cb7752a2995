//! Encrypting writer

use std::{
    fmt,
    io::{self, Write},
};

use bytes::BytesMut;
use sealstream_crypto::{Encryptor, EntropySource, Key, OsEntropy, Tag};

use crate::{config::FrameConfig, error::FrameError, frame::write_frame};

/// Encrypts plaintext written to it into a framed stream.
///
/// The header is written on construction. Plaintext is buffered until a
/// full `chunk_size` is available and then sealed as a [`Tag::Message`]
/// frame. [`end_message`](Self::end_message) closes a logical sub-message
/// early, and [`finish`](Self::finish) writes the final chunk.
///
/// Dropping the writer without calling `finish` leaves a stream the reader
/// reports as truncated.
///
/// Sealing advances the stream state before the frame reaches `inner`, so a
/// frame that fails to write leaves a gap no later frame can bridge. After
/// any such failure the writer is poisoned and every further call returns
/// [`FrameError::WriterPoisoned`].
pub struct StreamWriter<W: Write> {
    inner: W,
    encryptor: Encryptor,
    buffer: BytesMut,
    config: FrameConfig,
    plaintext_written: u64,
    poisoned: bool,
}

impl<W: Write> StreamWriter<W> {
    /// Start a stream under `key` and write its header to `inner`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `config` fails validation
    /// - `Stream(EntropyUnavailable)` if no header can be generated
    /// - `Io` if writing the header fails
    pub fn new(inner: W, key: &Key, config: FrameConfig) -> Result<Self, FrameError> {
        Self::with_entropy(inner, key, config, &OsEntropy)
    }

    /// Like [`new`](Self::new), with header randomness from `entropy`.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_entropy<E>(
        mut inner: W,
        key: &Key,
        config: FrameConfig,
        entropy: &E,
    ) -> Result<Self, FrameError>
    where
        E: EntropySource + ?Sized,
    {
        config.validate()?;

        let (encryptor, header) = Encryptor::init_push_with(key, entropy)?;
        inner.write_all(header.as_bytes())?;
        tracing::debug!(%header, chunk_size = config.chunk_size, "stream writer started");

        Ok(Self {
            inner,
            encryptor,
            buffer: BytesMut::with_capacity(config.chunk_size),
            config,
            plaintext_written: 0,
            poisoned: false,
        })
    }

    /// Buffer `data`, sealing every complete chunk.
    ///
    /// # Errors
    ///
    /// - `Io` if writing a frame fails
    /// - `WriterPoisoned` if an earlier frame failed
    pub fn write_plaintext(&mut self, mut data: &[u8]) -> Result<(), FrameError> {
        if self.poisoned {
            return Err(FrameError::WriterPoisoned);
        }

        while !data.is_empty() {
            let take = self.fill_chunk(data)?;
            data = &data[take..];
        }
        Ok(())
    }

    /// Seal buffered plaintext (possibly none) as the end of a sub-message.
    ///
    /// # Errors
    ///
    /// - `Io` if writing the frame fails
    /// - `WriterPoisoned` if an earlier frame failed
    pub fn end_message(&mut self) -> Result<(), FrameError> {
        self.seal_buffer(Tag::Push)
    }

    /// Seal the remaining plaintext as the final chunk and return the inner
    /// writer, flushed.
    ///
    /// # Errors
    ///
    /// - `Io` if writing or flushing fails
    /// - `WriterPoisoned` if an earlier frame failed
    pub fn finish(mut self) -> Result<W, FrameError> {
        self.seal_buffer(Tag::Final)?;
        self.inner.flush()?;

        tracing::debug!(
            chunks = self.encryptor.chunks_pushed(),
            bytes = self.plaintext_written,
            "stream writer finished"
        );
        Ok(self.inner)
    }

    /// Plaintext bytes accepted so far, including buffered bytes.
    pub fn plaintext_written(&self) -> u64 {
        self.plaintext_written + self.buffer.len() as u64
    }

    /// Chunks sealed so far.
    pub fn chunks_written(&self) -> u64 {
        self.encryptor.chunks_pushed()
    }

    // Buffer as much of `data` as fits in the current chunk, sealing it once
    // full. Returns the number of bytes taken.
    fn fill_chunk(&mut self, data: &[u8]) -> Result<usize, FrameError> {
        let room = self.config.chunk_size - self.buffer.len();
        let take = room.min(data.len());
        self.buffer.extend_from_slice(&data[..take]);

        if self.buffer.len() == self.config.chunk_size {
            self.seal_buffer(Tag::Message)?;
        }
        Ok(take)
    }

    fn seal_buffer(&mut self, tag: Tag) -> Result<(), FrameError> {
        if self.poisoned {
            return Err(FrameError::WriterPoisoned);
        }

        let written = match self.encryptor.push(&self.buffer, tag) {
            Ok(chunk) => write_frame(&mut self.inner, &chunk, self.config.max_frame_len),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = written {
            self.poisoned = true;
            tracing::warn!(%err, chunks = self.encryptor.chunks_pushed(), "stream writer poisoned");
            return Err(err);
        }

        self.plaintext_written += self.buffer.len() as u64;
        self.buffer.clear();
        Ok(())
    }
}

impl<W: Write> Write for StreamWriter<W> {
    // Takes at most one chunk per call so the count returned never covers
    // bytes behind a failed frame
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.poisoned {
            return Err(FrameError::WriterPoisoned.into());
        }
        Ok(self.fill_chunk(buf)?)
    }

    // Pushes already sealed frames downstream; a partial chunk stays buffered
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> fmt::Debug for StreamWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamWriter")
            .field("encryptor", &self.encryptor)
            .field("buffered", &self.buffer.len())
            .field("config", &self.config)
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}
