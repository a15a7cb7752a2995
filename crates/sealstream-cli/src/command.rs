//! Encrypt and decrypt commands

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use sealstream_crypto::Key;
use sealstream_io::{FrameConfig, decrypt_stream, encrypt_stream};

use crate::CliError;

/// Direction of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Plaintext in, framed stream out
    Encrypt,
    /// Framed stream in, plaintext out
    Decrypt,
}

/// Run one command. `None` paths mean stdin / stdout.
///
/// When decryption into a file fails, the partially written file is removed
/// so unauthenticated plaintext does not linger on disk.
///
/// Returns the number of plaintext bytes processed.
///
/// # Errors
///
/// - `SamePath` if input and output resolve to one file; opening the output
///   would truncate the input
/// - `Open` if an input or output file cannot be opened
/// - `Frame` if encryption or decryption fails
pub fn run(
    mode: Mode,
    key: &Key,
    input: Option<&Path>,
    output: Option<&Path>,
    config: FrameConfig,
) -> Result<u64, CliError> {
    if let (Some(input), Some(output)) = (input, output)
        && same_file(input, output)
    {
        return Err(CliError::SamePath { path: output.to_path_buf() });
    }

    let reader = open_input(input)?;
    let writer = open_output(output)?;

    let result = match mode {
        Mode::Encrypt => encrypt_stream(reader, writer, key, config),
        Mode::Decrypt => decrypt_stream(reader, writer, key, config),
    };

    match result {
        Ok(bytes) => {
            tracing::info!(?mode, bytes, "done");
            Ok(bytes)
        },
        Err(err) => {
            if let (Mode::Decrypt, Some(path)) = (mode, output) {
                tracing::warn!(path = %path.display(), "removing partial output");
                if let Err(remove_err) = fs::remove_file(path) {
                    tracing::error!(error = %remove_err, "failed to remove partial output");
                }
            }
            Err(err.into())
        },
    }
}

// Missing files never match, so a fresh output path is always accepted
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>, CliError> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|source| CliError::Open { path: path.to_path_buf(), source })?;
            Ok(Box::new(BufReader::new(file)))
        },
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, CliError> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|source| CliError::Open { path: path.to_path_buf(), source })?;
            Ok(Box::new(BufWriter::new(file)))
        },
        None => Ok(Box::new(io::stdout().lock())),
    }
}
