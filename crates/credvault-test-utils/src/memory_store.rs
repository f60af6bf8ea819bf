// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory key-value store for deterministic testing.
//!
//! Items live in a `BTreeMap` keyed by `(name, version)`, so range queries
//! order versions by their stored label exactly as a sorted-key backend does.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use credvault_core::{ItemKey, KeyValueStore, RangeQuery, SecretItem, StoreError};

#[derive(Default)]
struct Inner {
    items: BTreeMap<ItemKey, SecretItem>,
    /// Number of deletes allowed before every further delete fails.
    deletes_before_failure: Option<usize>,
    unavailable: bool,
}

/// A `KeyValueStore` backed by process memory.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Raw stored item, bypassing the driver.
    pub async fn raw_item(&self, name: &str, version: &str) -> Option<SecretItem> {
        self.inner
            .lock()
            .await
            .items
            .get(&ItemKey::new(name, version))
            .cloned()
    }

    /// Insert or replace an item without any condition.
    pub async fn insert_raw(&self, item: SecretItem) {
        self.inner.lock().await.items.insert(item.item_key(), item);
    }

    /// Mutate a stored item in place. Returns false if it does not exist.
    pub async fn tamper<F>(&self, name: &str, version: &str, f: F) -> bool
    where
        F: FnOnce(&mut SecretItem),
    {
        let mut inner = self.inner.lock().await;
        match inner.items.get_mut(&ItemKey::new(name, version)) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// Let `count` deletes succeed, then fail every following delete.
    pub async fn fail_deletes_after(&self, count: usize) {
        self.inner.lock().await.deletes_before_failure = Some(count);
    }

    /// Make every operation fail with a backend error.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().await.unavailable = unavailable;
    }
}

fn backend_error(message: &str) -> StoreError {
    StoreError::Backend(message.to_string().into())
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_item(&self, key: &ItemKey) -> Result<Option<SecretItem>, StoreError> {
        let inner = self.inner.lock().await;
        if inner.unavailable {
            return Err(backend_error("memory store unavailable"));
        }
        Ok(inner.items.get(key).cloned())
    }

    async fn put_if_absent(&self, item: SecretItem) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.unavailable {
            return Err(backend_error("memory store unavailable"));
        }
        let key = item.item_key();
        if inner.items.contains_key(&key) {
            return Err(StoreError::ConditionalCheckFailed);
        }
        inner.items.insert(key, item);
        Ok(())
    }

    async fn delete_item(&self, key: &ItemKey) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.unavailable {
            return Err(backend_error("memory store unavailable"));
        }
        if let Some(remaining) = inner.deletes_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(backend_error("injected delete failure"));
            }
            *remaining -= 1;
        }
        inner.items.remove(key);
        Ok(())
    }

    async fn query(&self, query: &RangeQuery) -> Result<Vec<SecretItem>, StoreError> {
        let inner = self.inner.lock().await;
        if inner.unavailable {
            return Err(backend_error("memory store unavailable"));
        }
        let matching = inner
            .items
            .iter()
            .filter(|(key, _)| key.name == query.name)
            .map(|(_, item)| item.clone());
        let mut items: Vec<SecretItem> = if query.descending {
            matching.rev().collect()
        } else {
            matching.collect()
        };
        if let Some(limit) = query.limit {
            items.truncate(limit);
        }
        Ok(items)
    }

    async fn scan_keys(&self) -> Result<Vec<ItemKey>, StoreError> {
        let inner = self.inner.lock().await;
        if inner.unavailable {
            return Err(backend_error("memory store unavailable"));
        }
        Ok(inner.items.keys().cloned().collect())
    }
}
