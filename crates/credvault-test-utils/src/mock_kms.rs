// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock key-management capability for deterministic testing.
//!
//! `MockKms` hands out random key material and an opaque random handle as the
//! "wrapped" form. Decrypt looks the handle up and enforces the encryption
//! context exactly like a real service would.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ring::rand::{SecureRandom, SystemRandom};
use tokio::sync::Mutex;
use zeroize::Zeroizing;

use credvault_core::{DataKey, EncryptionContext, KeyManagement, KmsError};

const HANDLE_LEN: usize = 16;

struct WrappedEntry {
    key_id: String,
    context: EncryptionContext,
    plaintext: Zeroizing<Vec<u8>>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<Vec<u8>, WrappedEntry>,
    /// When non-empty, only these key ids exist.
    known_keys: Vec<String>,
    unavailable: bool,
    generate_calls: usize,
    decrypt_calls: usize,
}

/// A `KeyManagement` implementation that keeps all key material in memory.
#[derive(Clone, Default)]
pub struct MockKms {
    inner: Arc<Mutex<Inner>>,
}

impl MockKms {
    /// A mock that accepts any key id.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock where only the listed key ids exist.
    pub fn with_keys(key_ids: &[&str]) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                known_keys: key_ids.iter().map(|k| k.to_string()).collect(),
                ..Inner::default()
            })),
        }
    }

    /// Make every call fail with a backend error.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().await.unavailable = unavailable;
    }

    pub async fn generate_calls(&self) -> usize {
        self.inner.lock().await.generate_calls
    }

    pub async fn decrypt_calls(&self) -> usize {
        self.inner.lock().await.decrypt_calls
    }

    /// Key id a wrapped handle was generated under.
    pub async fn key_id_of(&self, wrapped: &[u8]) -> Option<String> {
        self.inner
            .lock()
            .await
            .entries
            .get(wrapped)
            .map(|e| e.key_id.clone())
    }
}

fn random_bytes(len: usize) -> Result<Vec<u8>, KmsError> {
    let mut buf = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| KmsError::Backend("failed to generate random bytes".into()))?;
    Ok(buf)
}

#[async_trait]
impl KeyManagement for MockKms {
    fn name(&self) -> &str {
        "mock-kms"
    }

    async fn generate_data_key(
        &self,
        key_id: &str,
        context: &EncryptionContext,
        num_bytes: usize,
    ) -> Result<DataKey, KmsError> {
        let mut inner = self.inner.lock().await;
        inner.generate_calls += 1;
        if inner.unavailable {
            return Err(KmsError::Backend("mock kms unavailable".into()));
        }
        if !inner.known_keys.is_empty() && !inner.known_keys.iter().any(|k| k == key_id) {
            return Err(KmsError::KeyNotFound {
                key_id: key_id.to_string(),
            });
        }

        let plaintext = Zeroizing::new(random_bytes(num_bytes)?);
        let handle = random_bytes(HANDLE_LEN)?;
        inner.entries.insert(
            handle.clone(),
            WrappedEntry {
                key_id: key_id.to_string(),
                context: context.clone(),
                plaintext: plaintext.clone(),
            },
        );
        Ok(DataKey {
            plaintext,
            wrapped: handle,
        })
    }

    async fn decrypt(
        &self,
        wrapped: &[u8],
        context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, KmsError> {
        let mut inner = self.inner.lock().await;
        inner.decrypt_calls += 1;
        if inner.unavailable {
            return Err(KmsError::Backend("mock kms unavailable".into()));
        }
        match inner.entries.get(wrapped) {
            Some(entry) if entry.context == *context => Ok(entry.plaintext.clone()),
            _ => Err(KmsError::InvalidCiphertext),
        }
    }
}
