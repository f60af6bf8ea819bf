// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-item retrieval for wildcard names.
//!
//! A pattern is matched against the distinct stored names, then one
//! independent get runs per match. A failed get does not fail the lookup:
//! it is recorded in [`MultiRetrieval::failures`] and the caller decides
//! whether that is fatal. The results are keyed by name, so the order in
//! which the concurrent gets complete does not matter.

use std::collections::BTreeMap;

use credvault_core::{CredvaultError, EncryptionContext};
use credvault_crypto::codec;
use futures::stream::{self, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::driver::Driver;

/// A get that failed for one matched name.
#[derive(Debug)]
pub struct RetrievalFailure {
    pub name: String,
    pub error: CredvaultError,
}

/// Outcome of a wildcard lookup: decrypted values plus per-name failures.
#[derive(Debug, Default)]
pub struct MultiRetrieval {
    pub secrets: BTreeMap<String, SecretString>,
    pub failures: Vec<RetrievalFailure>,
}

impl MultiRetrieval {
    /// True when every matched name was retrieved.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Serialize the successful values as one JSON object, keys sorted.
    pub fn to_json(&self) -> Result<String, CredvaultError> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .secrets
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    serde_json::Value::String(value.expose_secret().to_string()),
                )
            })
            .collect();
        serde_json::to_string_pretty(&serde_json::Value::Object(map))
            .map_err(|e| CredvaultError::Internal(format!("failed to serialize secrets: {e}")))
    }

    /// Fail with the first recorded error if any get failed.
    pub fn into_complete(mut self) -> Result<Self, CredvaultError> {
        if self.failures.is_empty() {
            return Ok(self);
        }
        Err(self.failures.remove(0).error)
    }
}

/// Result of a [`Driver::lookup`].
#[derive(Debug)]
pub enum Lookup {
    /// A literal name resolved to one value.
    Single(SecretString),
    /// A pattern resolved to a name-to-value document.
    Many(MultiRetrieval),
}

/// True if `name` should be treated as a pattern.
pub fn is_pattern(name: &str) -> bool {
    name.contains('*')
}

/// Shell-style match where `*` matches any run of characters (including
/// none) and every other character matches itself.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if name.len() < first.len() + last.len() || !name.starts_with(first) || !name.ends_with(last)
    {
        return false;
    }

    // Middle segments must appear in order between the fixed prefix and suffix.
    let mut rest = &name[first.len()..name.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    true
}

impl Driver {
    /// Get every stored name matching `pattern`, each at `version` (or its
    /// newest version) with the same encryption context.
    pub async fn get_matching(
        &self,
        pattern: &str,
        version: Option<&str>,
        context: &EncryptionContext,
    ) -> Result<MultiRetrieval, CredvaultError> {
        // A malformed version is a bad request, not a per-name failure.
        if let Some(v) = version {
            codec::parse_version(v)?;
        }
        let names = self.list_names().await?;
        let matched: Vec<String> = names
            .into_iter()
            .filter(|name| glob_match(pattern, name))
            .collect();
        debug!(pattern, matched = matched.len(), "wildcard lookup");

        let outcomes: Vec<(String, Result<SecretString, CredvaultError>)> = stream::iter(matched)
            .map(|name| async move {
                let result = self.get_secret(&name, version, context).await;
                (name, result)
            })
            .buffer_unordered(self.max_concurrent_gets)
            .collect()
            .await;

        let mut retrieval = MultiRetrieval::default();
        for (name, result) in outcomes {
            match result {
                Ok(value) => {
                    retrieval.secrets.insert(name, value);
                }
                Err(error) => {
                    warn!(name = %name, error = %error, "skipping secret in wildcard lookup");
                    retrieval.failures.push(RetrievalFailure { name, error });
                }
            }
        }
        retrieval.failures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(retrieval)
    }

    /// Get the newest (or the given) version of every stored name.
    pub async fn get_all(
        &self,
        version: Option<&str>,
        context: &EncryptionContext,
    ) -> Result<MultiRetrieval, CredvaultError> {
        self.get_matching("*", version, context).await
    }

    /// Resolve a literal name to its value, or a pattern to a document.
    pub async fn lookup(
        &self,
        name: &str,
        version: Option<&str>,
        context: &EncryptionContext,
    ) -> Result<Lookup, CredvaultError> {
        if is_pattern(name) {
            self.get_matching(name, version, context)
                .await
                .map(Lookup::Many)
        } else {
            self.get_secret(name, version, context)
                .await
                .map(Lookup::Single)
        }
    }
}
