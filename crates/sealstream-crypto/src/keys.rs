//! Fixed-size key and header buffers

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::StreamError;

/// Length of a stream key (32 bytes)
pub const KEY_LEN: usize = 32;

/// Length of a stream header (24 bytes)
pub const HEADER_LEN: usize = 24;

/// Secret stream key.
///
/// Generated and distributed by the caller. The bytes are zeroized on drop,
/// never appear in `Debug` output, and only compare in constant time via
/// [`Key::ct_eq`].
pub struct Key([u8; KEY_LEN]);

impl Key {
    /// Wrap 32 bytes of key material.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Copy key material out of a slice.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength` if `bytes` is not exactly [`KEY_LEN`] long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, StreamError> {
        let array: [u8; KEY_LEN] = bytes.try_into().map_err(|_| StreamError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }

    /// Raw key bytes. Callers take responsibility for anything they copy out.
    pub fn expose_secret(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Constant-time equality.
    pub fn ct_eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl From<[u8; KEY_LEN]> for Key {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = StreamError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}

/// Per-stream header produced by [`crate::Encryptor::init_push`].
///
/// Not secret. Must reach the consumer before the first chunk. Every stream
/// gets a freshly randomized header, even when the key is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header([u8; HEADER_LEN]);

impl Header {
    /// Wrap 24 header bytes.
    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        Self(bytes)
    }

    /// Copy a header out of a slice.
    ///
    /// # Errors
    ///
    /// - `InvalidHeader` if `bytes` is not exactly [`HEADER_LEN`] long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, StreamError> {
        let array: [u8; HEADER_LEN] = bytes
            .try_into()
            .map_err(|_| StreamError::InvalidHeader { expected: HEADER_LEN, actual: bytes.len() })?;
        Ok(Self(array))
    }

    /// Header bytes as sent on the wire.
    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.0
    }
}

impl From<[u8; HEADER_LEN]> for Header {
    fn from(bytes: [u8; HEADER_LEN]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl TryFrom<&[u8]> for Header {
    type Error = StreamError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl AsRef<[u8]> for Header {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Header({self})")
    }
}
