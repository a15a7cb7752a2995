//! Chunk tags and decrypted chunks

use std::fmt;

/// Structural marker carried inside every chunk.
///
/// The tag is encrypted and covered by the chunk MAC: flipping a `Message`
/// into a `Final` (or any other change) fails authentication.
///
/// Byte values match libsodium's `crypto_secretstream_xchacha20poly1305`
/// constants. `Final` is `Push | Rekey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Ordinary chunk, more chunks follow
    Message = 0x00,
    /// End of a logical sub-message; the stream continues
    Push = 0x01,
    /// Subkey is replaced after this chunk
    Rekey = 0x02,
    /// Last chunk of the stream
    Final = 0x03,
}

impl Tag {
    /// Wire value of this tag.
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Tag for a wire value. `None` if unrecognized.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Message),
            0x01 => Some(Self::Push),
            0x02 => Some(Self::Rekey),
            0x03 => Some(Self::Final),
            _ => None,
        }
    }
}

/// A decrypted chunk.
///
/// Only produced by a successful [`crate::Decryptor::pull`].
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    data: Vec<u8>,
    tag: Tag,
}

impl Chunk {
    pub(crate) fn new(data: Vec<u8>, tag: Tag) -> Self {
        Self { data, tag }
    }

    /// Decrypted plaintext.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the chunk, returning the plaintext.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Tag the producer attached to this chunk.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Last chunk of the stream.
    pub fn is_final(&self) -> bool {
        self.tag == Tag::Final
    }

    /// End of a sub-message ([`Tag::Push`]).
    pub fn is_end(&self) -> bool {
        self.tag == Tag::Push
    }

    /// Subkey was replaced after this chunk.
    pub fn is_rekey(&self) -> bool {
        self.tag == Tag::Rekey
    }
}

// Plaintext stays out of Debug output
impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk").field("tag", &self.tag).field("len", &self.data.len()).finish()
    }
}
