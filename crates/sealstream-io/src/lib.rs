//! Sealstream transport framing
//!
//! Carries a secretstream over any byte-oriented transport (files, pipes,
//! sockets) using [`std::io::Read`] and [`std::io::Write`].
//!
//! # Wire Format
//!
//! ```text
//! ┌──────────────────┬───────────────────────────────┬─────┐
//! │ Header (24 bytes)│ len: u32 BE │ chunk (len bytes)│ ... │
//! └──────────────────┴───────────────────────────────┴─────┘
//! ```
//!
//! Every frame holds exactly one ciphertext chunk. The last frame carries the
//! `FINAL` tag; a reader that runs out of input before seeing it reports
//! [`FrameError::Truncated`], and any byte after it is
//! [`FrameError::TrailingData`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod frame;
pub mod pipe;
pub mod reader;
pub mod writer;

pub use config::FrameConfig;
pub use error::FrameError;
pub use frame::{LEN_PREFIX, read_frame, write_frame};
pub use pipe::{decrypt_stream, encrypt_stream};
pub use reader::StreamReader;
pub use writer::StreamWriter;
