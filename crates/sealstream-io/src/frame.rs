//! Length-prefixed frames.
//!
//! Layout on the wire:
//! `[length: u32 big-endian] + [ciphertext chunk: length bytes]`
//!
//! Frames carry no type or sequence information of their own. Ordering and
//! tags are authenticated inside the ciphertext, so the framing layer only
//! has to get the boundaries right.

use std::io::{self, Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::FrameError;

/// Size of the length prefix
pub const LEN_PREFIX: usize = 4;

/// Write one frame.
///
/// # Errors
///
/// - `FrameTooLarge` if `chunk` is longer than `max`
/// - `Io` if the writer fails
pub fn write_frame<W: Write>(writer: &mut W, chunk: &[u8], max: u32) -> Result<(), FrameError> {
    let len = u32::try_from(chunk.len()).unwrap_or(u32::MAX);
    if len > max {
        return Err(FrameError::FrameTooLarge { len, max });
    }

    let mut frame = BytesMut::with_capacity(LEN_PREFIX + chunk.len());
    frame.put_u32(len);
    frame.put_slice(chunk);
    writer.write_all(&frame)?;

    Ok(())
}

/// Read one frame.
///
/// Returns `None` on a clean end of input (no prefix byte available).
///
/// # Errors
///
/// - `FrameTooLarge` if the prefix announces more than `max` bytes; nothing
///   is allocated for the body
/// - `Truncated` if input ends inside the prefix or body
/// - `Io` if the reader fails
pub fn read_frame<R: Read>(reader: &mut R, max: u32) -> Result<Option<Vec<u8>>, FrameError> {
    let mut prefix = [0u8; LEN_PREFIX];
    let filled = read_full(reader, &mut prefix)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < LEN_PREFIX {
        return Err(FrameError::Truncated);
    }

    let len = u32::from_be_bytes(prefix);
    if len > max {
        return Err(FrameError::FrameTooLarge { len, max });
    }

    let mut body = vec![0u8; len as usize];
    if read_full(reader, &mut body)? < body.len() {
        return Err(FrameError::Truncated);
    }

    Ok(Some(body))
}

/// Fill `buf` as far as input allows, returning the byte count.
///
/// Unlike `read_exact`, a short count is reported rather than turned into an
/// error so callers can tell a clean end of input from a cut-off one.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {},
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn frame_layout_is_big_endian_prefix() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"abc", 16).unwrap();
        assert_eq!(wire, [0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn reads_back_consecutive_frames() {
        let mut wire = Vec::new();
        write_frame(&mut wire, b"first", 16).unwrap();
        write_frame(&mut wire, b"", 16).unwrap();

        let mut cursor = Cursor::new(wire);
        assert_eq!(read_frame(&mut cursor, 16).unwrap(), Some(b"first".to_vec()));
        assert_eq!(read_frame(&mut cursor, 16).unwrap(), Some(Vec::new()));
        assert_eq!(read_frame(&mut cursor, 16).unwrap(), None);
    }

    #[test]
    fn oversized_prefix_is_rejected_before_allocation() {
        let mut cursor = Cursor::new(vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            read_frame(&mut cursor, 1024),
            Err(FrameError::FrameTooLarge { len: u32::MAX, max: 1024 })
        ));
    }

    #[test]
    fn oversized_write_is_rejected() {
        let mut wire = Vec::new();
        assert!(matches!(
            write_frame(&mut wire, &[0u8; 9], 8),
            Err(FrameError::FrameTooLarge { len: 9, max: 8 })
        ));
        assert!(wire.is_empty());
    }

    #[test]
    fn partial_prefix_is_truncation() {
        let mut cursor = Cursor::new(vec![0, 0]);
        assert!(matches!(read_frame(&mut cursor, 16), Err(FrameError::Truncated)));
    }

    #[test]
    fn partial_body_is_truncation() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 5, 1, 2]);
        assert!(matches!(read_frame(&mut cursor, 16), Err(FrameError::Truncated)));
    }
}
