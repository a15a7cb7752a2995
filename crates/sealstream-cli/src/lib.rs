//! Sealstream command-line support
//!
//! Key file loading and the encrypt/decrypt commands behind the `sealstream`
//! binary. The binary itself only parses arguments and sets up logging.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod key_file;

use std::{io, path::PathBuf};

pub use command::{Mode, run};
pub use key_file::load_key;
use sealstream_io::FrameError;
use thiserror::Error;

/// Errors surfaced by the CLI
#[derive(Error, Debug)]
pub enum CliError {
    /// Key file could not be read
    #[error("cannot read key file {path}: {source}")]
    KeyFileUnreadable {
        /// Path given on the command line
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Key file contents are neither 32 raw bytes nor 64 hex characters
    #[error("key file {path} must hold 32 raw bytes or 64 hex characters")]
    InvalidKeyFile {
        /// Path given on the command line
        path: PathBuf,
    },

    /// Input or output file could not be opened
    #[error("cannot open {path}: {source}")]
    Open {
        /// Path given on the command line
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Input and output name the same file
    #[error("input and output are the same file: {path}")]
    SamePath {
        /// Path given for both
        path: PathBuf,
    },

    /// Encryption or decryption failed
    #[error(transparent)]
    Frame(#[from] FrameError),
}
