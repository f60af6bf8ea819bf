// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Credvault credential store.
//!
//! This crate provides the data model, error types, and the two capability
//! traits (key-value store and key management) that every other crate in the
//! workspace builds on.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{BoxError, CredvaultError, KmsError, StoreError};
pub use traits::{KeyManagement, KeyValueStore};
pub use types::{DataKey, EncryptionContext, ItemKey, MacAttribute, RangeQuery, SecretItem};
