// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data model shared between the driver and the capability implementations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CredvaultError;

/// Composite primary key of a stored secret.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub name: String,
    /// Version label exactly as persisted (zero-padded decimal).
    pub version: String,
}

impl ItemKey {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// The stored MAC attribute.
///
/// Items written by this crate always carry hex text. Some writers store the
/// same hex digits in a binary attribute instead, so both shapes are accepted
/// on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacAttribute {
    /// Hex digits stored as a string attribute.
    Text(String),
    /// Hex digits stored as raw bytes in a binary attribute.
    Binary(Vec<u8>),
}

/// One row of the credential table: a single version of a named secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretItem {
    pub name: String,
    pub version: String,
    /// Base64 of the wrapped key material returned by key management.
    pub key: String,
    /// Base64 of the encrypted payload.
    pub contents: String,
    pub hmac: MacAttribute,
}

impl SecretItem {
    pub fn item_key(&self) -> ItemKey {
        ItemKey::new(self.name.clone(), self.version.clone())
    }
}

/// Range query over all versions of one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub name: String,
    /// Newest version first when true.
    pub descending: bool,
    pub limit: Option<usize>,
    /// Request a strongly consistent read where the backend distinguishes.
    pub consistent: bool,
}

impl RangeQuery {
    /// The newest stored version of `name`, read consistently.
    pub fn latest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descending: true,
            limit: Some(1),
            consistent: true,
        }
    }

    /// Every stored version of `name`.
    pub fn all_versions(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descending: false,
            limit: None,
            consistent: true,
        }
    }
}

/// Key-value attributes bound into wrap/unwrap of the data key.
///
/// Backed by an ordered map so its canonical encoding is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptionContext(BTreeMap<String, String>);

impl EncryptionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` pairs as given on a command line.
    pub fn parse_pairs<I, S>(pairs: I) -> Result<Self, CredvaultError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = BTreeMap::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                CredvaultError::InvalidContext(format!("`{pair}` is not in key=value form"))
            })?;
            if key.is_empty() {
                return Err(CredvaultError::InvalidContext(format!(
                    "`{pair}` has an empty key"
                )));
            }
            map.insert(key.to_string(), value.to_string());
        }
        Ok(Self(map))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Deterministic byte encoding (JSON object with sorted keys).
    pub fn canonical_bytes(&self) -> Vec<u8> {
        if self.0.is_empty() {
            return Vec::new();
        }
        // A BTreeMap<String, String> always serializes.
        serde_json::to_vec(&self.0).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EncryptionContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for EncryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

/// Fresh key material returned by the key-management capability.
pub struct DataKey {
    /// Plaintext key bytes, zeroed on drop.
    pub plaintext: Zeroizing<Vec<u8>>,
    /// The same bytes wrapped for storage.
    pub wrapped: Vec<u8>,
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataKey")
            .field("plaintext", &"[REDACTED]")
            .field("wrapped_len", &self.wrapped.len())
            .finish()
    }
}
