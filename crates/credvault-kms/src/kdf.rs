// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id derivation of the key that wraps the key ring's root key.

use credvault_core::CredvaultError;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

pub const SALT_LEN: usize = 16;

/// Argon2id cost parameters, persisted next to the salt so a key ring can be
/// unlocked after the configured defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Derive a 32-byte key from `passphrase` and `salt`.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>, CredvaultError> {
    let argon_params = argon2::Params::new(
        params.memory_cost,
        params.iterations,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| CredvaultError::Crypto(format!("invalid Argon2id parameters: {e}")))?;
    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase, salt, output.as_mut())
        .map_err(|e| CredvaultError::Crypto(format!("Argon2id key derivation failed: {e}")))?;
    Ok(output)
}

pub fn generate_salt() -> Result<[u8; SALT_LEN], CredvaultError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| CredvaultError::Crypto("failed to generate random salt".to_string()))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: KdfParams = KdfParams {
        memory_cost: 32768,
        iterations: 2,
        parallelism: 1,
    };

    #[test]
    fn derivation_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key(b"correct horse", &salt, &FAST).unwrap();
        let b = derive_key(b"correct horse", &salt, &FAST).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn passphrase_salt_and_params_all_matter() {
        let salt = [7u8; SALT_LEN];
        let base = derive_key(b"one", &salt, &FAST).unwrap();
        assert_ne!(*base, *derive_key(b"two", &salt, &FAST).unwrap());
        assert_ne!(*base, *derive_key(b"one", &[8u8; SALT_LEN], &FAST).unwrap());
        let slower = KdfParams {
            iterations: 3,
            ..FAST
        };
        assert_ne!(*base, *derive_key(b"one", &salt, &slower).unwrap());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let bad = KdfParams {
            parallelism: 0,
            ..FAST
        };
        let err = derive_key(b"x", &[0u8; SALT_LEN], &bad).unwrap_err();
        assert!(matches!(err, CredvaultError::Crypto(_)));
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
    }
}
