//! XChaCha20-Poly1305 secretstream state
//!
//! # Security Properties
//!
//! - Chaining: every MAC is folded into the nonce, so chunk N only verifies
//!   after chunks 0..N were processed in order
//! - Verify-then-decrypt: `open` checks the MAC before touching plaintext and
//!   leaves the state unchanged on failure
//! - Forward Secrecy: `rekey` overwrites the subkey with keystream derived
//!   from it; the old subkey is not recoverable
//!
//! Byte layout and MAC input match libsodium, including its padding of the
//! ciphertext to `len mod 16` zero bytes.

use chacha20::{
    ChaCha20, Key as ChaChaKey, Nonce as ChaChaNonce,
    cipher::{
        KeyIvInit, StreamCipher,
        consts::{U10, U16},
        generic_array::GenericArray,
    },
    hchacha,
};
use poly1305::{Key as PolyKey, Poly1305, universal_hash::KeyInit};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::{
    error::AuthFailure,
    keys::{HEADER_LEN, Header, KEY_LEN, Key},
    tag::Tag,
};

/// Poly1305 tag size (16 bytes)
pub(super) const MAC_LEN: usize = 16;

/// ChaCha20-IETF nonce: 4-byte counter followed by the 8-byte inonce
const NONCE_LEN: usize = 12;

/// Little-endian chunk counter at the start of the nonce
const COUNTER_LEN: usize = 4;

/// Header prefix fed to HChaCha20
const HCHACHA_INPUT_LEN: usize = 16;

/// ChaCha20 block size; the tag occupies the first byte of block 1
const BLOCK_LEN: usize = 64;

/// Opaque per-side stream state.
///
/// Deliberately not `Clone`. Owned by exactly one [`super::Encryptor`] or
/// [`super::Decryptor`].
pub(crate) struct CipherState {
    /// Current subkey (32 bytes)
    key: [u8; KEY_LEN],
    /// Counter (bytes 0-3, little-endian) and inonce (bytes 4-11)
    nonce: [u8; NONCE_LEN],
}

impl CipherState {
    /// Derive the initial state from the stream key and header.
    ///
    /// Structure:
    /// - subkey: `HChaCha20(key, header[0..16])`
    /// - counter: 1
    /// - inonce: `header[16..24]`
    pub(crate) fn new(key: &Key, header: &Header) -> Self {
        let (salt, inonce) = header.as_bytes().split_at(HCHACHA_INPUT_LEN);
        debug_assert_eq!(inonce.len(), HEADER_LEN - HCHACHA_INPUT_LEN);

        let mut subkey = hchacha::<U10>(
            ChaChaKey::from_slice(key.expose_secret()),
            GenericArray::<u8, U16>::from_slice(salt),
        );

        let mut state = Self { key: [0u8; KEY_LEN], nonce: [0u8; NONCE_LEN] };
        state.key.copy_from_slice(&subkey);
        state.nonce[COUNTER_LEN..].copy_from_slice(inonce);
        state.reset_counter();

        subkey.as_mut_slice().zeroize();
        state
    }

    /// Encrypt one chunk and advance the state.
    ///
    /// Output: `encrypted tag (1) || ciphertext (len) || MAC (16)`.
    pub(crate) fn seal(&mut self, plaintext: &[u8], ad: &[u8], tag: u8) -> Vec<u8> {
        let mut cipher = self.cipher();
        let mut mac_key = one_time_mac_key(&mut cipher);

        // Block 1: tag byte, remainder of the keystream block goes into the MAC
        let mut block = [0u8; BLOCK_LEN];
        block[0] = tag;
        cipher.apply_keystream(&mut block);

        // Blocks 2..: message
        let mut out = Vec::with_capacity(plaintext.len() + 1 + MAC_LEN);
        out.push(block[0]);
        out.extend_from_slice(plaintext);
        cipher.apply_keystream(&mut out[1..]);

        let mac = compute_mac(&mac_key, ad, &block, &out[1..]);
        out.extend_from_slice(&mac);

        mac_key.zeroize();
        block.zeroize();

        self.advance(&mac, tag);
        out
    }

    /// Verify and decrypt one chunk, advancing the state on success only.
    ///
    /// Returns the plaintext and the raw decrypted tag byte.
    pub(crate) fn open(
        &mut self,
        ciphertext: &[u8],
        ad: &[u8],
    ) -> Result<(Vec<u8>, u8), AuthFailure> {
        let min = 1 + MAC_LEN;
        if ciphertext.len() < min {
            return Err(AuthFailure::Truncated { len: ciphertext.len(), min });
        }

        let (body, stored_mac) = ciphertext.split_at(ciphertext.len() - MAC_LEN);
        let encrypted_tag = body[0];
        let encrypted_message = &body[1..];

        let mut cipher = self.cipher();
        let mut mac_key = one_time_mac_key(&mut cipher);

        let mut block = [0u8; BLOCK_LEN];
        block[0] = encrypted_tag;
        cipher.apply_keystream(&mut block);
        let tag = block[0];
        block[0] = encrypted_tag;

        let mac = compute_mac(&mac_key, ad, &block, encrypted_message);
        mac_key.zeroize();
        block.zeroize();

        if !bool::from(mac.as_slice().ct_eq(stored_mac)) {
            return Err(AuthFailure::TagMismatch);
        }

        let mut plaintext = encrypted_message.to_vec();
        cipher.apply_keystream(&mut plaintext);

        self.advance(&mac, tag);
        Ok((plaintext, tag))
    }

    /// Replace the subkey and inonce with keystream derived from them.
    pub(crate) fn rekey(&mut self) {
        let mut material = [0u8; KEY_LEN + NONCE_LEN - COUNTER_LEN];
        material[..KEY_LEN].copy_from_slice(&self.key);
        material[KEY_LEN..].copy_from_slice(&self.nonce[COUNTER_LEN..]);

        self.cipher().apply_keystream(&mut material);

        self.key.zeroize();
        self.key.copy_from_slice(&material[..KEY_LEN]);
        self.nonce[COUNTER_LEN..].copy_from_slice(&material[KEY_LEN..]);
        self.reset_counter();

        material.zeroize();
    }

    /// Erase all key material. The state is unusable afterwards.
    pub(crate) fn wipe(&mut self) {
        self.key.zeroize();
        self.nonce.zeroize();
    }

    /// Fold the MAC into the inonce, bump the counter, rekey when required.
    fn advance(&mut self, mac: &[u8; MAC_LEN], tag: u8) {
        for (nonce_byte, mac_byte) in self.nonce[COUNTER_LEN..].iter_mut().zip(mac) {
            *nonce_byte ^= mac_byte;
        }

        let counter = self.counter().wrapping_add(1);
        self.nonce[..COUNTER_LEN].copy_from_slice(&counter.to_le_bytes());

        if tag & Tag::Rekey.to_byte() != 0 || counter == 0 {
            self.rekey();
        }
    }

    fn counter(&self) -> u32 {
        let mut bytes = [0u8; COUNTER_LEN];
        bytes.copy_from_slice(&self.nonce[..COUNTER_LEN]);
        u32::from_le_bytes(bytes)
    }

    fn reset_counter(&mut self) {
        self.nonce[..COUNTER_LEN].copy_from_slice(&1u32.to_le_bytes());
    }

    /// ChaCha20-IETF keyed with the current subkey and nonce, at block 0.
    fn cipher(&self) -> ChaCha20 {
        ChaCha20::new(ChaChaKey::from_slice(&self.key), ChaChaNonce::from_slice(&self.nonce))
    }

    #[cfg(test)]
    fn set_counter(&mut self, counter: u32) {
        self.nonce[..COUNTER_LEN].copy_from_slice(&counter.to_le_bytes());
    }
}

impl Drop for CipherState {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// Consume keystream block 0 and return its first 32 bytes as the Poly1305 key.
fn one_time_mac_key(cipher: &mut ChaCha20) -> [u8; 32] {
    let mut block = [0u8; BLOCK_LEN];
    cipher.apply_keystream(&mut block);

    let mut key = [0u8; 32];
    key.copy_from_slice(&block[..32]);
    block.zeroize();
    key
}

/// Poly1305 over the chunk.
///
/// Input layout:
/// - ad, zero-padded to a multiple of 16
/// - the 64-byte tag block (encrypted tag byte + keystream)
/// - ciphertext, followed by `len mod 16` zero bytes
/// - `len(ad)` as little-endian u64
/// - `64 + len(ciphertext)` as little-endian u64
fn compute_mac(
    mac_key: &[u8; 32],
    ad: &[u8],
    block: &[u8; BLOCK_LEN],
    ciphertext: &[u8],
) -> [u8; MAC_LEN] {
    let ad_padding = (MAC_LEN - ad.len() % MAC_LEN) % MAC_LEN;
    let ciphertext_padding = ciphertext.len() % MAC_LEN;

    let mut input = Vec::with_capacity(
        ad.len() + ad_padding + BLOCK_LEN + ciphertext.len() + ciphertext_padding + 16,
    );
    input.extend_from_slice(ad);
    input.resize(input.len() + ad_padding, 0);
    input.extend_from_slice(block);
    input.extend_from_slice(ciphertext);
    input.resize(input.len() + ciphertext_padding, 0);
    input.extend_from_slice(&(ad.len() as u64).to_le_bytes());
    input.extend_from_slice(&((BLOCK_LEN + ciphertext.len()) as u64).to_le_bytes());

    let tag = Poly1305::new(PolyKey::from_slice(mac_key)).compute_unpadded(&input);

    let mut mac = [0u8; MAC_LEN];
    mac.copy_from_slice(&tag);
    mac
}
