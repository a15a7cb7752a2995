//! Fuzz target for the consumer side of a stream
//!
//! Drives a producer and a consumer in lockstep and interleaves forged,
//! tampered and replayed chunks.
//!
//! # Strategy
//!
//! - Arbitrary keys, headers, plaintexts and additional data
//! - Honest chunks with every tag
//! - Raw forged byte strings (including shorter than the chunk overhead)
//! - Bit-flipped and replayed honest chunks
//! - Explicit rekeys on both sides
//!
//! # Invariants
//!
//! - Pull never panics
//! - Honest chunks verify in order with the pushed data and tag
//! - Tampered or replayed chunks never verify
//! - The first failure is terminal: every later pull returns `Aborted`
//! - Nothing verifies after the final chunk

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealstream_crypto::{
    Decryptor, Encryptor, EntropySource, Header, Key, PullState, StreamError, Tag, ABYTES,
};

#[derive(Debug, Clone, Arbitrary)]
struct PullScenario {
    key: [u8; 32],
    header: [u8; 24],
    operations: Vec<PullOperation>,
}

#[derive(Debug, Clone, Arbitrary)]
enum PullOperation {
    /// Push a chunk and pull it back
    Honest { data: Vec<u8>, ad: Vec<u8>, tag: u8 },
    /// Pull attacker-chosen bytes
    Forge { bytes: Vec<u8> },
    /// Push a chunk, flip bits, pull it
    Tamper { data: Vec<u8>, index: u16, mask: u8 },
    /// Pull the previous honest chunk again
    Replay,
    /// Rekey both sides
    Rekey,
}

struct FixedHeader([u8; 24]);

impl EntropySource for FixedHeader {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), StreamError> {
        buffer.copy_from_slice(&self.0[..buffer.len()]);
        Ok(())
    }
}

fn tag_from(byte: u8) -> Tag {
    match byte % 4 {
        0 => Tag::Message,
        1 => Tag::Push,
        2 => Tag::Rekey,
        _ => Tag::Final,
    }
}

fuzz_target!(|scenario: PullScenario| {
    let key = Key::from_bytes(scenario.key);
    let Ok((mut encryptor, header)) =
        Encryptor::init_push_with(&key, &FixedHeader(scenario.header))
    else {
        return;
    };
    assert_eq!(header, Header::from_bytes(scenario.header));

    let mut decryptor = Decryptor::from_header(&key, &header);
    let mut last_honest: Option<Vec<u8>> = None;

    for op in scenario.operations {
        let was_streaming = decryptor.state() == PullState::Streaming;

        match op {
            PullOperation::Honest { data, ad, tag } => {
                let tag = tag_from(tag);
                let Ok(chunk) = encryptor.push_with_ad(&data, &ad, tag) else {
                    // Producer finalized
                    assert!(encryptor.is_finalized());
                    continue;
                };
                assert_eq!(chunk.len(), data.len() + ABYTES);

                let result = decryptor.pull_with_ad(&chunk, &ad);
                if was_streaming {
                    // INVARIANT 1: Honest chunks verify while in sync
                    let pulled = result.expect("honest chunk must verify");
                    assert_eq!(pulled.data(), data.as_slice());
                    assert_eq!(pulled.tag(), tag);
                } else {
                    // INVARIANT 2: Terminal states reject everything
                    assert!(result.is_err());
                }
                last_honest = Some(chunk);
            },

            PullOperation::Forge { bytes } => {
                // INVARIANT 3: Forgeries never panic; failure is terminal
                if decryptor.pull(&bytes).is_err() {
                    assert_ne!(decryptor.state(), PullState::Streaming);
                }
            },

            PullOperation::Tamper { data, index, mask } => {
                if mask == 0 {
                    continue;
                }
                let Ok(mut chunk) = encryptor.push_message(&data) else {
                    continue;
                };
                let index = index as usize % chunk.len();
                chunk[index] ^= mask;

                // INVARIANT 4: Tampered chunks never verify
                assert!(decryptor.pull(&chunk).is_err());
                assert_ne!(decryptor.state(), PullState::Streaming);
            },

            PullOperation::Replay => {
                if let Some(chunk) = &last_honest {
                    // INVARIANT 5: Replays never verify
                    assert!(decryptor.pull(chunk).is_err());
                }
            },

            PullOperation::Rekey => {
                let pushed = encryptor.rekey();
                let pulled = decryptor.rekey();
                if was_streaming && pushed.is_ok() {
                    assert!(pulled.is_ok());
                }
            },
        }

        // INVARIANT 6: Aborted is permanent
        if decryptor.state() == PullState::Aborted {
            assert_eq!(decryptor.pull(&[0u8; ABYTES]), Err(StreamError::Aborted));
        }
    }
});
