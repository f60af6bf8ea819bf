// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envelope keys: one key-management call yields both the data key and the
//! integrity key for a single item.
//!
//! The call requests 64 bytes; the first half keys the cipher, the second
//! half keys the MAC. Both halves are independent random material.

use credvault_core::{CredvaultError, EncryptionContext, KeyManagement, KmsError};
use tracing::debug;
use zeroize::Zeroizing;

use crate::cipher::{self, KEY_LEN};

/// Bytes requested from key management per item.
pub const ENVELOPE_KEY_BYTES: usize = KEY_LEN * 2;

/// Unwrapped key pair for one item.
pub struct EnvelopeKeys {
    data_key: Zeroizing<[u8; KEY_LEN]>,
    integrity_key: Zeroizing<[u8; KEY_LEN]>,
}

impl std::fmt::Debug for EnvelopeKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeKeys")
            .field("data_key", &"[REDACTED]")
            .field("integrity_key", &"[REDACTED]")
            .finish()
    }
}

impl EnvelopeKeys {
    /// Split 64 bytes of key material into the cipher and MAC keys.
    pub fn from_material(material: &[u8]) -> Result<Self, CredvaultError> {
        if material.len() != ENVELOPE_KEY_BYTES {
            return Err(CredvaultError::Crypto(format!(
                "expected {ENVELOPE_KEY_BYTES} bytes of key material, got {}",
                material.len()
            )));
        }
        let mut data_key = Zeroizing::new([0u8; KEY_LEN]);
        let mut integrity_key = Zeroizing::new([0u8; KEY_LEN]);
        data_key.copy_from_slice(&material[..KEY_LEN]);
        integrity_key.copy_from_slice(&material[KEY_LEN..]);
        Ok(Self {
            data_key,
            integrity_key,
        })
    }

    pub fn data_key(&self) -> &[u8; KEY_LEN] {
        &self.data_key
    }

    pub fn integrity_key(&self) -> &[u8; KEY_LEN] {
        &self.integrity_key
    }

    /// Encrypt `plaintext` and MAC the ciphertext.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Sealed, CredvaultError> {
        let ciphertext = cipher::encrypt(plaintext, &self.data_key)?;
        let mac = cipher::mac(&ciphertext, &self.integrity_key);
        Ok(Sealed { ciphertext, mac })
    }

    /// Verify the MAC and, only if it matches, decrypt.
    pub fn open(
        &self,
        name: &str,
        ciphertext: &[u8],
        mac: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CredvaultError> {
        if !cipher::verify(ciphertext, mac, &self.integrity_key) {
            return Err(CredvaultError::IntegrityCheckFailed {
                name: name.to_string(),
            });
        }
        cipher::decrypt(ciphertext, &self.data_key).map(Zeroizing::new)
    }
}

/// Ciphertext plus its MAC, ready for encoding into an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub mac: Vec<u8>,
}

/// Freshly generated keys together with their wrapped form.
#[derive(Debug)]
pub struct Envelope {
    pub keys: EnvelopeKeys,
    pub wrapped_key: Vec<u8>,
}

/// Mint a fresh key pair bound to `key_id` and `context`.
pub async fn generate_envelope(
    kms: &dyn KeyManagement,
    key_id: &str,
    context: &EncryptionContext,
) -> Result<Envelope, CredvaultError> {
    let data_key = kms
        .generate_data_key(key_id, context, ENVELOPE_KEY_BYTES)
        .await?;
    let keys = EnvelopeKeys::from_material(&data_key.plaintext)?;
    debug!(key_id, backend = kms.name(), "generated envelope key");
    Ok(Envelope {
        keys,
        wrapped_key: data_key.wrapped,
    })
}

/// Unwrap stored key material for the item `name`.
///
/// An invalid-ciphertext failure is reported as a missing context when the
/// caller supplied none, and as a context mismatch otherwise. Other failures
/// pass through unchanged.
pub async fn unwrap_envelope(
    kms: &dyn KeyManagement,
    name: &str,
    wrapped_key: &[u8],
    context: &EncryptionContext,
) -> Result<EnvelopeKeys, CredvaultError> {
    let material = kms
        .decrypt(wrapped_key, context)
        .await
        .map_err(|e| match e {
            KmsError::InvalidCiphertext if context.is_empty() => {
                CredvaultError::EncryptionContextRequired {
                    name: name.to_string(),
                }
            }
            KmsError::InvalidCiphertext => CredvaultError::EncryptionContextMismatch {
                name: name.to_string(),
            },
            other => CredvaultError::KeyManagement(other),
        })?;
    EnvelopeKeys::from_material(&material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credvault_test_utils::MockKms;

    fn context(pairs: &[(&str, &str)]) -> EncryptionContext {
        pairs.iter().copied().collect()
    }

    #[test]
    fn material_splits_into_independent_halves() {
        let mut material = vec![0xaa; KEY_LEN];
        material.extend(vec![0xbb; KEY_LEN]);
        let keys = EnvelopeKeys::from_material(&material).unwrap();
        assert_eq!(keys.data_key(), &[0xaa; KEY_LEN]);
        assert_eq!(keys.integrity_key(), &[0xbb; KEY_LEN]);
    }

    #[test]
    fn material_of_wrong_length_is_rejected() {
        assert!(EnvelopeKeys::from_material(&[0u8; 32]).is_err());
    }

    #[test]
    fn open_rejects_tampered_mac() {
        let keys = EnvelopeKeys::from_material(&[5u8; ENVELOPE_KEY_BYTES]).unwrap();
        let mut sealed = keys.seal(b"value").unwrap();
        sealed.mac[0] ^= 0x80;
        let err = keys.open("x", &sealed.ciphertext, &sealed.mac).unwrap_err();
        assert!(matches!(err, CredvaultError::IntegrityCheckFailed { name } if name == "x"));
    }

    #[tokio::test]
    async fn generate_then_unwrap_yields_same_keys() {
        let kms = MockKms::new();
        let ctx = context(&[("app", "api")]);
        let envelope = generate_envelope(&kms, "alias/test", &ctx).await.unwrap();
        let keys = unwrap_envelope(&kms, "x", &envelope.wrapped_key, &ctx)
            .await
            .unwrap();
        assert_eq!(keys.data_key(), envelope.keys.data_key());
        assert_eq!(keys.integrity_key(), envelope.keys.integrity_key());
        assert_ne!(keys.data_key(), keys.integrity_key());
    }

    #[tokio::test]
    async fn each_envelope_gets_fresh_keys() {
        let kms = MockKms::new();
        let ctx = EncryptionContext::new();
        let a = generate_envelope(&kms, "k", &ctx).await.unwrap();
        let b = generate_envelope(&kms, "k", &ctx).await.unwrap();
        assert_ne!(a.keys.data_key(), b.keys.data_key());
        assert_ne!(a.wrapped_key, b.wrapped_key);
    }

    #[tokio::test]
    async fn missing_context_is_distinguished_from_mismatch() {
        let kms = MockKms::new();
        let stored = context(&[("a", "1")]);
        let envelope = generate_envelope(&kms, "k", &stored).await.unwrap();

        let err = unwrap_envelope(&kms, "x", &envelope.wrapped_key, &EncryptionContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CredvaultError::EncryptionContextRequired { .. }));

        let err = unwrap_envelope(&kms, "x", &envelope.wrapped_key, &context(&[("a", "2")]))
            .await
            .unwrap_err();
        assert!(matches!(err, CredvaultError::EncryptionContextMismatch { .. }));
    }

    #[tokio::test]
    async fn backend_failures_pass_through() {
        let kms = MockKms::new();
        kms.set_unavailable(true).await;
        let err = generate_envelope(&kms, "k", &EncryptionContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CredvaultError::KeyManagement(KmsError::Backend(_))));
    }
}
