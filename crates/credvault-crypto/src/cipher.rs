// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payload cipher (AES-256-CTR) and ciphertext MAC (HMAC-SHA256).
//!
//! The counter block is fixed and starts at 1. This is only sound because
//! every stored item is encrypted under a freshly generated data key that is
//! never used for a second item.

use aes::Aes256;
use credvault_core::CredvaultError;
use ctr::cipher::{KeyIvInit, StreamCipher};
use ring::hmac;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Length in bytes of the data key and of the integrity key.
pub const KEY_LEN: usize = 32;

/// Initial counter block: 128-bit big-endian counter starting at 1.
const INITIAL_COUNTER: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];

fn apply_keystream(data: &[u8], data_key: &[u8; KEY_LEN]) -> Result<Vec<u8>, CredvaultError> {
    let mut cipher = Aes256Ctr::new_from_slices(data_key, &INITIAL_COUNTER)
        .map_err(|e| CredvaultError::Crypto(format!("failed to create AES-256-CTR cipher: {e}")))?;
    let mut buf = data.to_vec();
    cipher.apply_keystream(&mut buf);
    Ok(buf)
}

/// Encrypt a payload under a single-use data key.
pub fn encrypt(plaintext: &[u8], data_key: &[u8; KEY_LEN]) -> Result<Vec<u8>, CredvaultError> {
    apply_keystream(plaintext, data_key)
}

/// Decrypt a payload. CTR mode is symmetric, so this mirrors [`encrypt`].
pub fn decrypt(ciphertext: &[u8], data_key: &[u8; KEY_LEN]) -> Result<Vec<u8>, CredvaultError> {
    apply_keystream(ciphertext, data_key)
}

/// HMAC-SHA256 tag over the ciphertext bytes.
pub fn mac(ciphertext: &[u8], integrity_key: &[u8; KEY_LEN]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, integrity_key);
    hmac::sign(&key, ciphertext).as_ref().to_vec()
}

/// Check `tag` against the ciphertext in constant time.
pub fn verify(ciphertext: &[u8], tag: &[u8], integrity_key: &[u8; KEY_LEN]) -> bool {
    let key = hmac::Key::new(hmac::HMAC_SHA256, integrity_key);
    hmac::verify(&key, ciphertext, tag).is_ok()
}
