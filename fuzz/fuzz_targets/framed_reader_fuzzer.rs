//! Fuzz target for the framed stream reader
//!
//! # Strategy
//!
//! - Raw attacker-controlled byte streams
//! - Honestly sealed streams with one mutation applied (bit flip, truncation,
//!   appended bytes, rewritten length prefix)
//! - Small chunk sizes to produce many frames
//!
//! # Invariants
//!
//! - Reading never panics and never allocates past the frame limit
//! - Unmodified streams decrypt to the original plaintext
//! - Every mutation is reported as an integrity failure

#![no_main]

use std::io::Cursor;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealstream_crypto::{Key, HEADER_LEN};
use sealstream_io::{decrypt_stream, encrypt_stream, FrameConfig};

const MAX_FRAME_LEN: u32 = 64 * 1024;

#[derive(Debug, Clone, Arbitrary)]
enum ReaderScenario {
    /// Arbitrary bytes straight into the reader
    Raw { key: [u8; 32], wire: Vec<u8> },
    /// Sealed stream with an optional mutation
    Sealed { key: [u8; 32], plaintext: Vec<u8>, chunk_size: u8, mutation: Option<Mutation> },
}

#[derive(Debug, Clone, Arbitrary)]
enum Mutation {
    FlipBit { bit: u32 },
    Truncate { keep: u32 },
    Append { extra: Vec<u8> },
    SetLength { frame_offset: u32, len: u32 },
}

fn config(chunk_size: usize) -> FrameConfig {
    FrameConfig { chunk_size, max_frame_len: MAX_FRAME_LEN }
}

fuzz_target!(|scenario: ReaderScenario| {
    match scenario {
        ReaderScenario::Raw { key, wire } => {
            // INVARIANT 1: Arbitrary input never panics
            let key = Key::from_bytes(key);
            let mut out = Vec::new();
            let _ = decrypt_stream(Cursor::new(&wire), &mut out, &key, config(1024));
        },

        ReaderScenario::Sealed { key, plaintext, chunk_size, mutation } => {
            let key = Key::from_bytes(key);
            let config = config(usize::from(chunk_size).max(1));

            let mut wire = Vec::new();
            encrypt_stream(Cursor::new(&plaintext), &mut wire, &key, config)
                .expect("sealing into memory must succeed");

            let Some(mutation) = mutation else {
                // INVARIANT 2: Unmodified streams roundtrip
                let mut out = Vec::new();
                decrypt_stream(Cursor::new(&wire), &mut out, &key, config)
                    .expect("honest stream must verify");
                assert_eq!(out, plaintext);
                return;
            };

            let changed = match mutation {
                Mutation::FlipBit { bit } => {
                    let bit = bit as usize % (wire.len() * 8);
                    wire[bit / 8] ^= 1 << (bit % 8);
                    true
                },
                Mutation::Truncate { keep } => {
                    let keep = keep as usize % wire.len();
                    wire.truncate(keep);
                    true
                },
                Mutation::Append { extra } => {
                    wire.extend_from_slice(&extra);
                    !extra.is_empty()
                },
                Mutation::SetLength { frame_offset, len } => {
                    let frames = wire.len() - HEADER_LEN;
                    let at = HEADER_LEN + frame_offset as usize % frames.saturating_sub(3).max(1);
                    let before = wire[at..at + 4].to_vec();
                    wire[at..at + 4].copy_from_slice(&len.to_be_bytes());
                    before != wire[at..at + 4]
                },
            };

            let mut out = Vec::new();
            let result = decrypt_stream(Cursor::new(&wire), &mut out, &key, config);
            if changed {
                // INVARIANT 3: Any change is an integrity failure
                let err = result.expect_err("modified stream must not verify");
                assert!(err.is_integrity_failure(), "unexpected error: {err}");
            }
        },
    }
});
