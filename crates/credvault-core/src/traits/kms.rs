// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-management capability: mints and unwraps per-item data keys.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::error::KmsError;
use crate::types::{DataKey, EncryptionContext};

/// External key-management service.
///
/// Both operations bind `context` into the wrapping. A decrypt with a context
/// that differs from the one used at generation time must fail with
/// [`KmsError::InvalidCiphertext`].
#[async_trait]
pub trait KeyManagement: Send + Sync + 'static {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Generate `num_bytes` of fresh random key material under `key_id`.
    async fn generate_data_key(
        &self,
        key_id: &str,
        context: &EncryptionContext,
        num_bytes: usize,
    ) -> Result<DataKey, KmsError>;

    /// Unwrap material previously returned by
    /// [`generate_data_key`](KeyManagement::generate_data_key).
    async fn decrypt(
        &self,
        wrapped: &[u8],
        context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, KmsError>;
}
