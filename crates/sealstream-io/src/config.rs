//! Framing configuration

use sealstream_crypto::ciphertext_len;

use crate::error::FrameError;

/// Chunking and size limits for framed streams.
///
/// Both sides of a stream should agree on `max_frame_len`; `chunk_size` only
/// matters to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Plaintext bytes per `MESSAGE` chunk
    pub chunk_size: usize,

    /// Largest ciphertext frame a reader will allocate for
    pub max_frame_len: u32,
}

impl FrameConfig {
    /// Default plaintext chunk size (64 KiB)
    pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

    /// Default frame limit (16 MiB)
    pub const DEFAULT_MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `chunk_size` is zero or a full chunk would not
    ///   fit in `max_frame_len`
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.chunk_size == 0 {
            return Err(FrameError::InvalidConfig { reason: "chunk size must be non-zero".into() });
        }

        let frame_len = self.chunk_size.checked_add(ciphertext_len(0)).unwrap_or(usize::MAX);
        if frame_len > self.max_frame_len as usize {
            return Err(FrameError::InvalidConfig {
                reason: format!(
                    "chunk of {} bytes seals to {frame_len}, above the {}-byte frame limit",
                    self.chunk_size, self.max_frame_len
                ),
            });
        }

        Ok(())
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { chunk_size: Self::DEFAULT_CHUNK_SIZE, max_frame_len: Self::DEFAULT_MAX_FRAME_LEN }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = FrameConfig::default();
        assert_eq!(config.chunk_size, 65_536);
        assert_eq!(config.max_frame_len, 16_777_216);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let config = FrameConfig { chunk_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(FrameError::InvalidConfig { .. })));
    }

    #[test]
    fn chunk_must_fit_in_frame() {
        let exact = FrameConfig { chunk_size: 100 - 17, max_frame_len: 100 };
        assert!(exact.validate().is_ok());

        let over = FrameConfig { chunk_size: 100 - 16, max_frame_len: 100 };
        assert!(matches!(over.validate(), Err(FrameError::InvalidConfig { .. })));

        let huge = FrameConfig { chunk_size: usize::MAX, ..Default::default() };
        assert!(huge.validate().is_err());
    }
}
