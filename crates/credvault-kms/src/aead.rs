// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM seal/open with associated data.
//!
//! Every [`seal`] draws a fresh random 96-bit nonce from the system CSPRNG.

use credvault_core::CredvaultError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;
pub const TAG_LEN: usize = 16;
pub use ring::aead::NONCE_LEN;

fn aead_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, CredvaultError> {
    UnboundKey::new(&AES_256_GCM, key)
        .map(LessSafeKey::new)
        .map_err(|_| CredvaultError::Crypto("failed to create AES-256-GCM key".to_string()))
}

/// Encrypt `plaintext`, authenticating `aad` alongside it.
///
/// Returns `(ciphertext_with_tag, nonce)`; both are needed to open.
pub fn seal(
    key: &[u8; KEY_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, [u8; NONCE_LEN]), CredvaultError> {
    let key = aead_key(key)?;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| CredvaultError::Crypto("failed to generate random nonce".to_string()))?;

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::from(aad),
        &mut in_out,
    )
    .map_err(|_| CredvaultError::Crypto("AES-256-GCM encryption failed".to_string()))?;
    Ok((in_out, nonce_bytes))
}

/// Decrypt and authenticate. Fails on a wrong key, wrong `aad`, or any
/// modification of the ciphertext or tag.
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CredvaultError> {
    let key = aead_key(key)?;
    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let len = key
        .open_in_place(Nonce::assume_unique_for_key(*nonce), Aad::from(aad), &mut in_out)
        .map_err(|_| {
            CredvaultError::Crypto("AES-256-GCM authentication failed".to_string())
        })?
        .len();
    in_out.truncate(len);
    Ok(in_out)
}

/// `len` bytes from the system CSPRNG.
pub fn random_bytes(len: usize) -> Result<Zeroizing<Vec<u8>>, CredvaultError> {
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| CredvaultError::Crypto("failed to generate random bytes".to_string()))?;
    Ok(bytes)
}

/// A random 256-bit key.
pub fn generate_key() -> Result<Zeroizing<[u8; KEY_LEN]>, CredvaultError> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    SystemRandom::new()
        .fill(key.as_mut())
        .map_err(|_| CredvaultError::Crypto("failed to generate random key".to_string()))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip_with_aad() {
        let key = generate_key().unwrap();
        let (ct, nonce) = seal(&key, b"root key material", b"ctx").unwrap();
        assert_eq!(ct.len(), 17 + TAG_LEN);
        let pt = open(&key, &nonce, &ct, b"ctx").unwrap();
        assert_eq!(pt.as_slice(), b"root key material");
    }

    #[test]
    fn wrong_aad_fails() {
        let key = generate_key().unwrap();
        let (ct, nonce) = seal(&key, b"data", br#"{"env":"prod"}"#).unwrap();
        assert!(open(&key, &nonce, &ct, br#"{"env":"dev"}"#).is_err());
        assert!(open(&key, &nonce, &ct, b"").is_err());
    }

    #[test]
    fn wrong_key_or_tampering_fails() {
        let key = generate_key().unwrap();
        let other = generate_key().unwrap();
        let (mut ct, nonce) = seal(&key, b"data", b"").unwrap();
        assert!(open(&other, &nonce, &ct, b"").is_err());
        ct[0] ^= 0x80;
        assert!(open(&key, &nonce, &ct, b"").is_err());
    }

    #[test]
    fn nonces_are_fresh() {
        let key = generate_key().unwrap();
        let (ct1, n1) = seal(&key, b"same", b"").unwrap();
        let (ct2, n2) = seal(&key, b"same", b"").unwrap();
        assert_ne!(n1, n2);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn random_bytes_has_requested_length() {
        assert_eq!(random_bytes(64).unwrap().len(), 64);
        assert!(random_bytes(0).unwrap().is_empty());
    }
}
