//! Whole-stream helpers

use std::io::{self, Read, Write};

use sealstream_crypto::Key;

use crate::{config::FrameConfig, error::FrameError, reader::StreamReader, writer::StreamWriter};

/// Encrypt everything from `input` into a framed stream on `output`.
///
/// Returns the number of plaintext bytes consumed.
///
/// # Errors
///
/// - `InvalidConfig` if `config` fails validation
/// - `Stream(EntropyUnavailable)` if no header can be generated
/// - `Io` if reading or writing fails
pub fn encrypt_stream<R: Read, W: Write>(
    mut input: R,
    output: W,
    key: &Key,
    config: FrameConfig,
) -> Result<u64, FrameError> {
    let mut writer = StreamWriter::new(output, key, config)?;
    let mut buf = vec![0u8; config.chunk_size];

    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        writer.write_plaintext(&buf[..n])?;
    }

    let total = writer.plaintext_written();
    writer.finish()?;
    Ok(total)
}

/// Verify and decrypt a framed stream from `input` onto `output`.
///
/// Returns the number of plaintext bytes written. Plaintext reaches `output`
/// chunk by chunk; on error, whatever was written must be discarded.
///
/// # Errors
///
/// - `Stream` if any chunk fails verification
/// - `Truncated` or `TrailingData` if the stream is incomplete or padded
/// - `Io` if reading or writing fails
pub fn decrypt_stream<R: Read, W: Write>(
    input: R,
    mut output: W,
    key: &Key,
    config: FrameConfig,
) -> Result<u64, FrameError> {
    let mut reader = StreamReader::new(input, key, config)?;

    while let Some(chunk) = reader.next_chunk()? {
        output.write_all(chunk.data())?;
    }
    output.flush()?;

    let total = reader.plaintext_read();
    reader.finish()?;
    Ok(total)
}
