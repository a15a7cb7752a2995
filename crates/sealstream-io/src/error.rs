//! Errors for framed streams
//!
//! Framing errors wrap the stream errors from `sealstream-crypto` and add the
//! failures that only exist once chunks travel over a byte stream: short
//! reads, oversized length prefixes and bytes after the final chunk.

use std::io;

use sealstream_crypto::StreamError;
use thiserror::Error;

/// Errors from reading or writing a framed stream.
#[derive(Error, Debug)]
pub enum FrameError {
    /// Underlying reader or writer failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stream construction rejected the operation
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Length prefix exceeds the configured frame limit
    #[error("frame of {len} bytes exceeds maximum of {max}")]
    FrameTooLarge {
        /// Length announced by the prefix
        len: u32,
        /// Configured limit
        max: u32,
    },

    /// Input ended before the final chunk
    #[error("stream truncated before the final chunk")]
    Truncated,

    /// Bytes follow the final chunk
    #[error("unexpected data after the final chunk")]
    TrailingData,

    /// An earlier frame failed to reach the writer, so the stream has a gap
    #[error("stream writer failed earlier and cannot continue")]
    WriterPoisoned,

    /// Configuration cannot be used
    #[error("invalid frame configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it
        reason: String,
    },
}

impl FrameError {
    /// Returns true if the received stream is not authentic or not complete.
    ///
    /// Plaintext already handed out by the reader must be discarded.
    pub fn is_integrity_failure(&self) -> bool {
        match self {
            Self::Stream(err) => err.is_auth_failure(),
            Self::FrameTooLarge { .. } | Self::Truncated | Self::TrailingData => true,
            Self::Io(_) | Self::WriterPoisoned | Self::InvalidConfig { .. } => false,
        }
    }
}

/// Convert `FrameError` to `io::Error` for the `Read`/`Write` impls.
///
/// This is only for boundary conversion - internally we use `FrameError`.
impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self {
        let kind = match &err {
            FrameError::Io(inner) => inner.kind(),
            FrameError::Truncated => io::ErrorKind::UnexpectedEof,
            FrameError::InvalidConfig { .. } => io::ErrorKind::InvalidInput,
            FrameError::Stream(StreamError::EntropyUnavailable { .. })
            | FrameError::WriterPoisoned => io::ErrorKind::Other,
            FrameError::Stream(_) | FrameError::FrameTooLarge { .. } | FrameError::TrailingData => {
                io::ErrorKind::InvalidData
            },
        };
        match err {
            FrameError::Io(inner) => inner,
            other => Self::new(kind, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use sealstream_crypto::AuthFailure;

    use super::*;

    #[test]
    fn integrity_failures() {
        assert!(FrameError::Truncated.is_integrity_failure());
        assert!(FrameError::TrailingData.is_integrity_failure());
        assert!(FrameError::FrameTooLarge { len: 10, max: 5 }.is_integrity_failure());
        let forged = FrameError::from(StreamError::from(AuthFailure::TagMismatch));
        assert!(forged.is_integrity_failure());

        assert!(!FrameError::from(StreamError::Finalized).is_integrity_failure());
        assert!(!FrameError::from(io::Error::other("disk")).is_integrity_failure());
        assert!(!FrameError::WriterPoisoned.is_integrity_failure());
    }

    #[test]
    fn io_error_kinds() {
        let err: io::Error = FrameError::Truncated.into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err: io::Error = FrameError::from(StreamError::from(AuthFailure::TagMismatch)).into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err: io::Error = FrameError::Io(io::Error::from(io::ErrorKind::BrokenPipe)).into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let err: io::Error = FrameError::WriterPoisoned.into();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn stream_errors_display_transparently() {
        let err = FrameError::from(StreamError::Finalized);
        assert_eq!(err.to_string(), "stream already finalized");
    }
}
