// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Credvault credential store.
//!
//! The two capability errors ([`StoreError`], [`KmsError`]) are categorised by
//! the capability implementation itself. Nothing above the capability boundary
//! inspects error messages to decide what went wrong.

use thiserror::Error;

/// Boxed error used for opaque backend failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by a key-value store capability.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional put found an item already stored under the same key.
    #[error("conditional check failed: item already exists")]
    ConditionalCheckFailed,

    /// Any other backend failure (connection, query, serialization).
    #[error("backend error: {0}")]
    Backend(BoxError),
}

/// Errors surfaced by a key-management capability.
#[derive(Debug, Error)]
pub enum KmsError {
    /// The wrapped material could not be decrypted. This covers both corrupt
    /// material and an encryption context that does not match.
    #[error("invalid ciphertext")]
    InvalidCiphertext,

    /// The requested wrapping key does not exist.
    #[error("wrapping key `{key_id}` not found")]
    KeyNotFound { key_id: String },

    /// A wrapping key with this id already exists.
    #[error("wrapping key `{key_id}` already exists")]
    KeyExists { key_id: String },

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(BoxError),
}

/// The primary error type used across all Credvault crates.
#[derive(Debug, Error)]
pub enum CredvaultError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A version label is not a non-negative decimal integer.
    #[error("invalid version `{0}`: expected a non-negative integer")]
    InvalidVersion(String),

    /// An encryption context pair could not be parsed.
    #[error("invalid encryption context: {0}")]
    InvalidContext(String),

    /// A stored attribute could not be decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// Local cryptographic failure (cipher setup, random generation).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// No item exists for the requested name (and version, if given).
    #[error("item couldn't be found: {{\"name\": {name:?}{}}}", format_version(.version))]
    ItemNotFound { name: String, version: Option<u64> },

    /// The credential was stored with an encryption context, but none was supplied.
    #[error(
        "{name}: could not decrypt HMAC key: the credential may require that an \
         encryption context be provided to decrypt it"
    )]
    EncryptionContextRequired { name: String },

    /// The supplied encryption context differs from the one used at write time.
    #[error(
        "{name}: could not decrypt HMAC key: the encryption context provided may not \
         match the one used when the credential was stored"
    )]
    EncryptionContextMismatch { name: String },

    /// The stored MAC does not match the ciphertext.
    #[error("{name}: computed HMAC does not match stored HMAC")]
    IntegrityCheckFailed { name: String },

    /// A conditional write lost to an existing item with the same version.
    #[error(
        "version already in the credential store (name: {name:?}, highest version: \
         {current_highest}); specify a newer version"
    )]
    VersionAlreadyExists { name: String, current_highest: u64 },

    /// Passthrough from the key-management capability.
    #[error("key management error: {0}")]
    KeyManagement(#[from] KmsError),

    /// Passthrough from the key-value store capability.
    #[error("storage error: {source}")]
    Storage {
        #[from]
        source: StoreError,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

fn format_version(version: &Option<u64>) -> String {
    match version {
        Some(v) => format!(", \"version\": {v}"),
        None => String::new(),
    }
}

impl CredvaultError {
    /// Wrap an arbitrary backend error as a storage failure.
    pub fn storage(source: impl Into<BoxError>) -> Self {
        CredvaultError::Storage {
            source: StoreError::Backend(source.into()),
        }
    }

    /// Returns true for errors that mean "nothing stored under this key".
    pub fn is_not_found(&self) -> bool {
        matches!(self, CredvaultError::ItemNotFound { .. })
    }
}
