//! Error types for stream operations

use thiserror::Error;

/// Reasons a chunk failed verification.
///
/// All variants are treated identically by the decryptor: the stream is
/// aborted and no plaintext is returned. The distinction exists for
/// diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// Ciphertext is too short to contain the tag byte and MAC
    #[error("ciphertext of {len} bytes is shorter than the {min}-byte chunk overhead")]
    Truncated {
        /// Length of the rejected ciphertext
        len: usize,
        /// Minimum ciphertext length
        min: usize,
    },

    /// MAC does not verify against the running stream state
    #[error("authentication tag mismatch")]
    TagMismatch,

    /// MAC verified but the decrypted tag byte is not a known tag
    #[error("unrecognized chunk tag {0:#04x}")]
    UnknownTag(u8),
}

/// Errors from stream operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Key material has the wrong length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length
        expected: usize,
        /// Actual key length
        actual: usize,
    },

    /// Header has the wrong length
    #[error("invalid header length: expected {expected}, got {actual}")]
    InvalidHeader {
        /// Expected header length
        expected: usize,
        /// Actual header length
        actual: usize,
    },

    /// Randomness for a new header could not be obtained
    #[error("entropy source unavailable: {reason}")]
    EntropyUnavailable {
        /// Reason reported by the entropy source
        reason: String,
    },

    /// Chunk failed authentication; the decryptor is now aborted
    #[error("authentication failed: {0}")]
    AuthenticationFailed(#[from] AuthFailure),

    /// Plaintext exceeds the per-chunk limit of the construction
    #[error("chunk of {len} bytes exceeds maximum of {max}")]
    MessageTooLong {
        /// Plaintext length
        len: u64,
        /// Maximum plaintext length per chunk
        max: u64,
    },

    /// Operation attempted after the final chunk
    #[error("stream already finalized")]
    Finalized,

    /// Operation attempted after a previous failure aborted the stream
    #[error("stream aborted after a previous failure")]
    Aborted,
}

impl StreamError {
    /// Returns true if this error is fatal (unrecoverable)
    ///
    /// Fatal errors indicate a broken environment rather than bad input.
    /// Everything else is scoped to a single stream: discard that stream's
    /// state and start over with a fresh header.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::EntropyUnavailable { .. } => true,

            Self::InvalidKeyLength { .. }
            | Self::InvalidHeader { .. }
            | Self::AuthenticationFailed(_)
            | Self::MessageTooLong { .. }
            | Self::Finalized
            | Self::Aborted => false,
        }
    }

    /// Returns true if a chunk failed verification.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_failure_is_fatal() {
        let err = StreamError::EntropyUnavailable { reason: "no device".to_string() };
        assert!(err.is_fatal());
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn auth_failure_is_not_fatal() {
        let err = StreamError::from(AuthFailure::TagMismatch);
        assert!(!err.is_fatal());
        assert!(err.is_auth_failure());
    }

    #[test]
    fn contract_violations_are_not_auth_failures() {
        assert!(!StreamError::Finalized.is_auth_failure());
        assert!(!StreamError::Aborted.is_auth_failure());
        assert!(!StreamError::InvalidHeader { expected: 24, actual: 3 }.is_fatal());
    }

    #[test]
    fn error_display() {
        let err = StreamError::InvalidHeader { expected: 24, actual: 23 };
        assert_eq!(err.to_string(), "invalid header length: expected 24, got 23");

        let err = StreamError::from(AuthFailure::UnknownTag(0x07));
        assert_eq!(err.to_string(), "authentication failed: unrecognized chunk tag 0x07");
    }
}
