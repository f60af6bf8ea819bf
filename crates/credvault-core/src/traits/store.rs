// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store capability holding one row per `(name, version)`.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{ItemKey, RangeQuery, SecretItem};

/// Persistence backend for secret items.
///
/// Implementations must make [`put_if_absent`](KeyValueStore::put_if_absent)
/// atomic: of two concurrent calls for the same key, exactly one succeeds.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Point lookup by composite key.
    async fn get_item(&self, key: &ItemKey) -> Result<Option<SecretItem>, StoreError>;

    /// Insert `item`, failing with [`StoreError::ConditionalCheckFailed`] if an
    /// item already exists under the same key.
    async fn put_if_absent(&self, item: SecretItem) -> Result<(), StoreError>;

    /// Delete one item. Deleting a missing key is not an error.
    async fn delete_item(&self, key: &ItemKey) -> Result<(), StoreError>;

    /// Items for one name, ordered by the stored version label.
    async fn query(&self, query: &RangeQuery) -> Result<Vec<SecretItem>, StoreError>;

    /// Projection scan of every `(name, version)` pair in the store.
    async fn scan_keys(&self) -> Result<Vec<ItemKey>, StoreError>;
}
