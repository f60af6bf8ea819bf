// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring a [`Driver`] to in-memory capabilities.
//!
//! The harness keeps handles to the mock store and key management so tests
//! can inspect or tamper with persisted state behind the driver's back.

use std::sync::Arc;

use credvault_core::{CredvaultError, EncryptionContext};
use credvault_driver::Driver;

use crate::memory_store::MemoryStore;
use crate::mock_kms::MockKms;

/// Wrapping key id used by harness helpers.
pub const TEST_KEY_ID: &str = "alias/credvault-test";

/// A fully wired driver plus its backing mocks.
pub struct TestHarness {
    pub driver: Driver,
    pub store: MemoryStore,
    pub kms: MockKms,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// Harness with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Store `value` as `version` of `name` without an encryption context.
    pub async fn put(&self, name: &str, version: &str, value: &str) -> Result<u64, CredvaultError> {
        self.driver
            .put_secret(name, value, version, TEST_KEY_ID, &EncryptionContext::new())
            .await
    }

    /// Store `value` with an encryption context given as pairs.
    pub async fn put_with_context(
        &self,
        name: &str,
        version: &str,
        value: &str,
        context: &[(&str, &str)],
    ) -> Result<u64, CredvaultError> {
        let context: EncryptionContext = context.iter().copied().collect();
        self.driver
            .put_secret(name, value, version, TEST_KEY_ID, &context)
            .await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`TestHarness`].
#[derive(Default)]
pub struct TestHarnessBuilder {
    store: Option<MemoryStore>,
    kms: Option<MockKms>,
    max_concurrent_gets: Option<usize>,
}

impl TestHarnessBuilder {
    pub fn with_store(mut self, store: MemoryStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_kms(mut self, kms: MockKms) -> Self {
        self.kms = Some(kms);
        self
    }

    pub fn with_max_concurrent_gets(mut self, max: usize) -> Self {
        self.max_concurrent_gets = Some(max);
        self
    }

    pub fn build(self) -> TestHarness {
        let store = self.store.unwrap_or_default();
        let kms = self.kms.unwrap_or_default();
        let mut driver = Driver::new(Arc::new(store.clone()), Arc::new(kms.clone()));
        if let Some(max) = self.max_concurrent_gets {
            driver = driver.with_max_concurrent_gets(max);
        }
        TestHarness { driver, store, kms }
    }
}
