//! Known-answer tests against libsodium's secretstream output
//!
//! Vectors were produced with `crypto_secretstream_xchacha20poly1305` using
//! key `00 01 .. 1f` and header `a0 a1 .. b7`, pushing the chunks below in
//! order on a single stream.

use sealstream_crypto::{
    Decryptor, Encryptor, EntropySource, HEADER_LEN, Header, KEY_LEN, Key, StreamError, Tag,
};

struct FixedHeader;

impl EntropySource for FixedHeader {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), StreamError> {
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = 0xA0 + i as u8;
        }
        Ok(())
    }
}

fn test_key() -> Key {
    Key::from_bytes(std::array::from_fn(|i| i as u8))
}

fn test_header() -> Header {
    Header::from_bytes(std::array::from_fn(|i| 0xA0 + i as u8))
}

struct Vector {
    plaintext: &'static [u8],
    ad: &'static [u8],
    tag: Tag,
    ciphertext: &'static str,
}

const STREAM: &[Vector] = &[
    Vector {
        plaintext: b"Hello world!",
        ad: b"",
        tag: Tag::Message,
        ciphertext: "3557292f11bde87d763cf2547f1eb06f8dd6737a322d3d7e9c38621a08",
    },
    Vector {
        plaintext: b"",
        ad: b"",
        tag: Tag::Push,
        ciphertext: "c88ee20f23f96f8175d95035372c876d47",
    },
    Vector {
        plaintext: b"chunk three with some more bytes in it!",
        ad: b"meta",
        tag: Tag::Rekey,
        ciphertext: "dad31e69c84781a7c27b431ef3f7df91f77dc3c102b044258188ca39ee02d098\
                     ca3f21f164a434572f563b2954ffa1d2ce1fc13633a7c7d8",
    },
    Vector {
        plaintext: b"xxxxxxxxxxxxxxxxx",
        ad: b"",
        tag: Tag::Message,
        ciphertext: "ba6a636ef62e407de754f0ba53d8de97d0fe5f57b28442854467f239d61da9c6c35f",
    },
    Vector {
        plaintext: b"the end",
        ad: b"",
        tag: Tag::Final,
        ciphertext: "9d49aa0a18011906134fef00408a6d42c64021d786014e12",
    },
];

#[test]
fn fixed_header_source_matches_vector_header() {
    assert_eq!(KEY_LEN, 32);
    assert_eq!(HEADER_LEN, 24);

    let (_, header) = Encryptor::init_push_with(&test_key(), &FixedHeader).unwrap();
    assert_eq!(header, test_header());
}

#[test]
fn push_matches_libsodium() {
    let (mut encryptor, _) = Encryptor::init_push_with(&test_key(), &FixedHeader).unwrap();

    for (i, vector) in STREAM.iter().enumerate() {
        let ciphertext = encryptor.push_with_ad(vector.plaintext, vector.ad, vector.tag).unwrap();
        assert_eq!(hex::encode(&ciphertext), vector.ciphertext, "chunk {i} diverged");
    }

    assert!(encryptor.is_finalized());
}

#[test]
fn pull_accepts_libsodium_stream() {
    let mut decryptor = Decryptor::init_pull(&test_key(), test_header().as_bytes()).unwrap();

    for vector in STREAM {
        let ciphertext = hex::decode(vector.ciphertext).unwrap();
        let chunk = decryptor.pull_with_ad(&ciphertext, vector.ad).unwrap();

        assert_eq!(chunk.data(), vector.plaintext);
        assert_eq!(chunk.tag(), vector.tag);
    }

    assert!(decryptor.is_finished());
}

#[test]
fn hello_world_chunk_is_29_bytes() {
    let ciphertext = hex::decode(STREAM[0].ciphertext).unwrap();
    assert_eq!(ciphertext.len(), 29);
}

#[test]
fn explicit_rekey_matches_libsodium() {
    let (mut encryptor, _) = Encryptor::init_push_with(&test_key(), &FixedHeader).unwrap();
    encryptor.rekey().unwrap();

    let ciphertext = encryptor.push(b"after", Tag::Message).unwrap();
    assert_eq!(hex::encode(&ciphertext), "78a31cf1f39c283809442eb977043f0ed356930566f9");

    let mut decryptor = Decryptor::from_header(&test_key(), &test_header());
    decryptor.rekey().unwrap();
    assert_eq!(decryptor.pull(&ciphertext).unwrap().data(), b"after");
}

#[test]
fn skipping_a_vector_chunk_fails() {
    let mut decryptor = Decryptor::from_header(&test_key(), &test_header());
    let second = hex::decode(STREAM[1].ciphertext).unwrap();

    let err = decryptor.pull(&second).unwrap_err();
    assert!(err.is_auth_failure());
}
