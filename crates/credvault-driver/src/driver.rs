// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store driver: put, get, delete, and list versioned secrets.
//!
//! Every operation is a short, independent sequence of calls to the two
//! capabilities. Nothing is retried; nothing is cached between calls. The
//! only concurrency guarantee relied on is the store's atomic conditional
//! insert, which decides the winner when two writers race on one version.

use std::collections::BTreeSet;
use std::sync::Arc;

use credvault_core::{
    CredvaultError, EncryptionContext, ItemKey, KeyManagement, KeyValueStore, MacAttribute,
    RangeQuery, SecretItem, StoreError,
};
use credvault_crypto::codec::{self, b64_decode, b64_encode, decode_mac, hex_encode};
use credvault_crypto::{generate_envelope, unwrap_envelope};
use secrecy::SecretString;
use tracing::{debug, info};

/// Version used by a put when the caller does not pick one.
pub const DEFAULT_VERSION: u64 = 1;

/// Default bound on concurrent gets during a wildcard lookup.
pub const DEFAULT_MAX_CONCURRENT_GETS: usize = 8;

/// Envelope-encryption driver over a key-value store and a key-management service.
///
/// Both capabilities are long-lived handles constructed once by the caller
/// and shared by every operation.
#[derive(Clone)]
pub struct Driver {
    store: Arc<dyn KeyValueStore>,
    kms: Arc<dyn KeyManagement>,
    pub(crate) max_concurrent_gets: usize,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("store", &self.store.name())
            .field("kms", &self.kms.name())
            .field("max_concurrent_gets", &self.max_concurrent_gets)
            .finish()
    }
}

impl Driver {
    pub fn new(store: Arc<dyn KeyValueStore>, kms: Arc<dyn KeyManagement>) -> Self {
        Self {
            store,
            kms,
            max_concurrent_gets: DEFAULT_MAX_CONCURRENT_GETS,
        }
    }

    /// Bound the number of gets a wildcard lookup runs at once (minimum 1).
    pub fn with_max_concurrent_gets(mut self, max: usize) -> Self {
        self.max_concurrent_gets = max.max(1);
        self
    }

    /// Encrypt and store `secret` as `version` of `name`.
    ///
    /// Fails with [`CredvaultError::VersionAlreadyExists`] if that version is
    /// already stored; the error names the current highest version so the
    /// caller can pick a newer one. Version 0 is reserved for "nothing
    /// stored" and is rejected. Returns the stored version number.
    pub async fn put_secret(
        &self,
        name: &str,
        secret: &str,
        version: &str,
        key_id: &str,
        context: &EncryptionContext,
    ) -> Result<u64, CredvaultError> {
        let version_num = codec::parse_version(version)?;
        if version_num == 0 {
            return Err(CredvaultError::InvalidVersion(version.to_string()));
        }
        let label = codec::format_version(version_num);

        let envelope = generate_envelope(self.kms.as_ref(), key_id, context).await?;
        let sealed = envelope.keys.seal(secret.as_bytes())?;

        let item = SecretItem {
            name: name.to_string(),
            version: label,
            key: b64_encode(&envelope.wrapped_key),
            contents: b64_encode(&sealed.ciphertext),
            hmac: MacAttribute::Text(hex_encode(&sealed.mac)),
        };

        match self.store.put_if_absent(item).await {
            Ok(()) => {
                info!(name, version = version_num, key_id, "secret stored");
                Ok(version_num)
            }
            Err(StoreError::ConditionalCheckFailed) => {
                let current_highest = self.highest_version(name).await?;
                debug!(name, version = version_num, current_highest, "version conflict");
                Err(CredvaultError::VersionAlreadyExists {
                    name: name.to_string(),
                    current_highest,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Store `secret` under the next free version (highest + 1).
    ///
    /// The version is read and then written without a lock; a concurrent
    /// writer that wins the race makes this call fail with a conflict.
    pub async fn put_secret_auto(
        &self,
        name: &str,
        secret: &str,
        key_id: &str,
        context: &EncryptionContext,
    ) -> Result<u64, CredvaultError> {
        let next = self.next_version(name).await?;
        self.put_secret(name, secret, &next.to_string(), key_id, context)
            .await
    }

    /// Fetch and decrypt one secret. `None` selects the newest version.
    pub async fn get_secret(
        &self,
        name: &str,
        version: Option<&str>,
        context: &EncryptionContext,
    ) -> Result<SecretString, CredvaultError> {
        let item = match version {
            None => self.latest_item(name).await?,
            Some(v) => {
                let version_num = codec::parse_version(v)?;
                let key = ItemKey::new(name, codec::format_version(version_num));
                self.store.get_item(&key).await?.ok_or_else(|| {
                    CredvaultError::ItemNotFound {
                        name: name.to_string(),
                        version: Some(version_num),
                    }
                })?
            }
        };
        self.decrypt_item(&item, context).await
    }

    /// Unwrap, verify, and decrypt a stored item.
    ///
    /// The MAC is checked before any ciphertext is decrypted. A `contents` or
    /// `hmac` attribute that no longer decodes has been altered, so it fails
    /// the integrity check like any other tampering.
    pub async fn decrypt_item(
        &self,
        item: &SecretItem,
        context: &EncryptionContext,
    ) -> Result<SecretString, CredvaultError> {
        let wrapped = b64_decode(&item.key)?;
        let keys = unwrap_envelope(self.kms.as_ref(), &item.name, &wrapped, context).await?;

        let tampered = |_: CredvaultError| CredvaultError::IntegrityCheckFailed {
            name: item.name.clone(),
        };
        let mac = decode_mac(&item.hmac).map_err(tampered)?;
        let ciphertext = b64_decode(&item.contents).map_err(tampered)?;
        let plaintext = keys.open(&item.name, &ciphertext, &mac)?;

        let value = String::from_utf8(plaintext.to_vec())
            .map_err(|e| CredvaultError::Codec(format!("decrypted value is not valid UTF-8: {e}")))?;
        debug!(name = %item.name, version = %item.version, "secret decrypted");
        Ok(SecretString::from(value))
    }

    /// Delete one version of `name`, or every version when `version` is `None`.
    ///
    /// Versions are deleted one at a time in ascending order and
    /// `on_deleted` is called after each. A failure stops the loop; versions
    /// already deleted stay deleted. Returns the number of deleted versions.
    pub async fn delete_secrets<F>(
        &self,
        name: &str,
        version: Option<&str>,
        mut on_deleted: F,
    ) -> Result<usize, CredvaultError>
    where
        F: FnMut(&ItemKey),
    {
        let targets = match version {
            None => {
                let items = self.store.query(&RangeQuery::all_versions(name)).await?;
                if items.is_empty() {
                    return Err(CredvaultError::ItemNotFound {
                        name: name.to_string(),
                        version: None,
                    });
                }
                let mut keys: Vec<ItemKey> = items.iter().map(SecretItem::item_key).collect();
                keys.sort();
                keys
            }
            Some(v) => {
                let version_num = codec::parse_version(v)?;
                let key = ItemKey::new(name, codec::format_version(version_num));
                match self.store.get_item(&key).await? {
                    Some(item) => vec![item.item_key()],
                    None => {
                        return Err(CredvaultError::ItemNotFound {
                            name: name.to_string(),
                            version: Some(version_num),
                        });
                    }
                }
            }
        };

        for key in &targets {
            self.store.delete_item(key).await?;
            info!(name = %key.name, version = %codec::display_version(&key.version), "secret deleted");
            on_deleted(key);
        }
        Ok(targets.len())
    }

    /// Every stored `(name, version)` pair, sorted by name then version.
    ///
    /// Nothing is decrypted. The result may be large; it is returned whole.
    pub async fn list_secrets(&self) -> Result<Vec<ItemKey>, CredvaultError> {
        let mut keys = self.store.scan_keys().await?;
        keys.sort();
        Ok(keys)
    }

    /// Distinct stored names.
    pub async fn list_names(&self) -> Result<BTreeSet<String>, CredvaultError> {
        Ok(self
            .store
            .scan_keys()
            .await?
            .into_iter()
            .map(|key| key.name)
            .collect())
    }

    /// Numeric value of the newest version of `name`, or 0 if none is stored.
    pub async fn highest_version(&self, name: &str) -> Result<u64, CredvaultError> {
        let items = self.store.query(&RangeQuery::latest(name)).await?;
        match items.first() {
            Some(item) => codec::parse_version(&item.version),
            None => Ok(0),
        }
    }

    /// The version an auto-versioned put would use.
    pub async fn next_version(&self, name: &str) -> Result<u64, CredvaultError> {
        let highest = self.highest_version(name).await?;
        highest
            .checked_add(1)
            .filter(|v| *v <= codec::MAX_VERSION)
            .ok_or_else(|| CredvaultError::InvalidVersion(format!("{highest} + 1")))
    }

    async fn latest_item(&self, name: &str) -> Result<SecretItem, CredvaultError> {
        self.store
            .query(&RangeQuery::latest(name))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CredvaultError::ItemNotFound {
                name: name.to_string(),
                version: None,
            })
    }
}
