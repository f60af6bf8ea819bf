// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local key ring: a key-management capability backed by the credential
//! database.
//!
//! Key wrapping has two levels:
//! - A random root key is sealed under an Argon2id passphrase-derived key
//!   (`kms_meta`). Changing KDF defaults never invalidates an existing ring
//!   because salt and parameters are stored beside it.
//! - Named wrapping keys are random 256-bit keys sealed under the root key
//!   (`kms_keys`), each bound to its own id through the AAD.
//!
//! Data keys are wrapped under a named key into a self-describing blob:
//!
//! ```text
//! [format = 1][id_len: u8][key_id][nonce: 12][AES-256-GCM ciphertext + tag]
//! ```
//!
//! The AAD of that seal is the canonical encoding of the encryption context,
//! so unwrapping under any other context fails authentication.

use async_trait::async_trait;
use credvault_core::{
    BoxError, CredvaultError, DataKey, EncryptionContext, KeyManagement, KmsError,
};
use credvault_storage::Database;
use rusqlite::{OptionalExtension, params};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::aead::{self, KEY_LEN, NONCE_LEN};
use crate::kdf::{self, KdfParams, SALT_LEN};

/// Version byte leading every wrapped data key.
pub const BLOB_FORMAT: u8 = 1;

const ROOT_KEY_AAD: &[u8] = b"credvault:root-key";

/// Metadata about one named wrapping key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub key_id: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

struct RootMeta {
    wrapped_root_key: Vec<u8>,
    nonce: Vec<u8>,
    salt: Vec<u8>,
    params: Vec<u8>,
}

/// An unlocked key ring. Holds the root key in memory only.
pub struct LocalKms {
    root_key: Zeroizing<[u8; KEY_LEN]>,
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for LocalKms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKms")
            .field("root_key", &"[REDACTED]")
            .finish()
    }
}

fn key_aad(key_id: &str) -> Vec<u8> {
    format!("credvault:key:{key_id}").into_bytes()
}

fn db_error(e: tokio_rusqlite::Error<rusqlite::Error>) -> CredvaultError {
    CredvaultError::storage(e)
}

fn kms_backend(e: tokio_rusqlite::Error<rusqlite::Error>) -> KmsError {
    KmsError::Backend(Box::new(e))
}

fn to_array<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N], CredvaultError> {
    bytes
        .try_into()
        .map_err(|_| CredvaultError::Crypto(format!("corrupted key ring: bad {what} length")))
}

/// Key ids must fit the one-byte length prefix of the blob format.
pub fn validate_key_id(key_id: &str) -> Result<(), CredvaultError> {
    if key_id.trim().is_empty() {
        return Err(CredvaultError::Config("key id must not be empty".to_string()));
    }
    if key_id.len() > u8::MAX as usize {
        return Err(CredvaultError::Config(format!(
            "key id must be at most {} bytes",
            u8::MAX
        )));
    }
    Ok(())
}

impl LocalKms {
    /// True if the database already holds a key ring.
    pub async fn exists(db: &Database) -> Result<bool, CredvaultError> {
        db.connection()
            .call(|conn| -> Result<bool, rusqlite::Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM kms_meta WHERE key = 'wrapped_root_key'",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(db_error)
    }

    /// Create a new key ring protected by `passphrase`.
    pub async fn create(
        db: &Database,
        passphrase: &SecretString,
        params: KdfParams,
    ) -> Result<Self, CredvaultError> {
        if Self::exists(db).await? {
            return Err(CredvaultError::Config(
                "key ring already exists in this database".to_string(),
            ));
        }

        let root_key = aead::generate_key()?;
        let salt = kdf::generate_salt()?;
        let wrapping_key = kdf::derive_key(passphrase.expose_secret().as_bytes(), &salt, &params)?;
        let (wrapped_root_key, nonce) = aead::seal(&wrapping_key, root_key.as_ref(), ROOT_KEY_AAD)?;
        let params_json = serde_json::to_vec(&params)
            .map_err(|e| CredvaultError::Internal(format!("failed to encode KDF params: {e}")))?;

        let salt = salt.to_vec();
        let nonce = nonce.to_vec();
        db.connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                for (key, value) in [
                    ("wrapped_root_key", wrapped_root_key),
                    ("root_key_nonce", nonce),
                    ("kdf_salt", salt),
                    ("kdf_params", params_json),
                ] {
                    tx.execute(
                        "INSERT INTO kms_meta (key, value) VALUES (?1, ?2)",
                        params![key, value],
                    )?;
                }
                tx.commit()
            })
            .await
            .map_err(db_error)?;

        info!(
            memory_cost = params.memory_cost,
            iterations = params.iterations,
            parallelism = params.parallelism,
            "key ring created"
        );
        Ok(Self {
            root_key,
            conn: db.connection().clone(),
        })
    }

    /// Unlock an existing key ring.
    pub async fn unlock(db: &Database, passphrase: &SecretString) -> Result<Self, CredvaultError> {
        let meta = db
            .connection()
            .call(|conn| -> Result<Option<RootMeta>, rusqlite::Error> {
                let get = |key: &str| -> Result<Option<Vec<u8>>, rusqlite::Error> {
                    conn.query_row(
                        "SELECT value FROM kms_meta WHERE key = ?1",
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()
                };
                let (Some(wrapped_root_key), Some(nonce), Some(salt), Some(params)) = (
                    get("wrapped_root_key")?,
                    get("root_key_nonce")?,
                    get("kdf_salt")?,
                    get("kdf_params")?,
                ) else {
                    return Ok(None);
                };
                Ok(Some(RootMeta {
                    wrapped_root_key,
                    nonce,
                    salt,
                    params,
                }))
            })
            .await
            .map_err(db_error)?
            .ok_or_else(|| {
                CredvaultError::Config(
                    "no key ring found: run `credvault setup` first".to_string(),
                )
            })?;

        let params: KdfParams = serde_json::from_slice(&meta.params)
            .map_err(|e| CredvaultError::Crypto(format!("corrupted key ring: bad KDF params: {e}")))?;
        let salt: [u8; SALT_LEN] = to_array(&meta.salt, "salt")?;
        let nonce: [u8; NONCE_LEN] = to_array(&meta.nonce, "nonce")?;

        let wrapping_key = kdf::derive_key(passphrase.expose_secret().as_bytes(), &salt, &params)?;
        let root = aead::open(&wrapping_key, &nonce, &meta.wrapped_root_key, ROOT_KEY_AAD)
            .map_err(|_| {
                CredvaultError::Crypto(
                    "failed to unlock key ring: wrong passphrase or corrupted data".to_string(),
                )
            })?;
        let root_key = Zeroizing::new(to_array::<KEY_LEN>(&root, "root key")?);

        debug!("key ring unlocked");
        Ok(Self {
            root_key,
            conn: db.connection().clone(),
        })
    }

    /// Create a named wrapping key.
    pub async fn create_key(&self, key_id: &str) -> Result<(), CredvaultError> {
        validate_key_id(key_id)?;

        let key = aead::generate_key()?;
        let (wrapped_key, nonce) = aead::seal(&self.root_key, key.as_ref(), &key_aad(key_id))?;
        let created_at = chrono::Utc::now().to_rfc3339();
        let id = key_id.to_string();

        let inserted = self
            .conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO kms_keys (key_id, wrapped_key, nonce, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, wrapped_key, nonce.to_vec(), created_at],
                )
            })
            .await
            .map_err(db_error)?;

        if inserted == 0 {
            return Err(KmsError::KeyExists {
                key_id: key_id.to_string(),
            }
            .into());
        }
        info!(key_id, "wrapping key created");
        Ok(())
    }

    /// Every named wrapping key, sorted by id.
    pub async fn list_keys(&self) -> Result<Vec<KeyInfo>, CredvaultError> {
        self.conn
            .call(|conn| -> Result<Vec<KeyInfo>, rusqlite::Error> {
                let mut stmt =
                    conn.prepare("SELECT key_id, created_at FROM kms_keys ORDER BY key_id")?;
                let rows = stmt.query_map([], |row| {
                    Ok(KeyInfo {
                        key_id: row.get(0)?,
                        created_at: row.get(1)?,
                    })
                })?;
                rows.collect()
            })
            .await
            .map_err(db_error)
    }

    /// Unwrap a named key with the root key.
    async fn load_key(&self, key_id: &str) -> Result<Zeroizing<[u8; KEY_LEN]>, KmsError> {
        let id = key_id.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(Vec<u8>, Vec<u8>)>, rusqlite::Error> {
                conn.query_row(
                    "SELECT wrapped_key, nonce FROM kms_keys WHERE key_id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
            })
            .await
            .map_err(kms_backend)?;

        let (wrapped, nonce) = row.ok_or_else(|| KmsError::KeyNotFound {
            key_id: key_id.to_string(),
        })?;
        let corrupted = || -> KmsError {
            let msg: BoxError = format!("key ring entry `{key_id}` is corrupted").into();
            KmsError::Backend(msg)
        };
        let nonce: [u8; NONCE_LEN] = nonce.as_slice().try_into().map_err(|_| corrupted())?;
        let key = aead::open(&self.root_key, &nonce, &wrapped, &key_aad(key_id))
            .map_err(|_| corrupted())?;
        let key: [u8; KEY_LEN] = key.as_slice().try_into().map_err(|_| corrupted())?;
        Ok(Zeroizing::new(key))
    }
}

/// Parsed view of a wrapped data key blob.
struct Blob<'a> {
    key_id: &'a str,
    nonce: [u8; NONCE_LEN],
    ciphertext: &'a [u8],
}

fn encode_blob(key_id: &str, nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(2 + key_id.len() + NONCE_LEN + ciphertext.len());
    blob.push(BLOB_FORMAT);
    // Key ids are validated to fit in one byte at creation.
    blob.push(key_id.len() as u8);
    blob.extend_from_slice(key_id.as_bytes());
    blob.extend_from_slice(nonce);
    blob.extend_from_slice(ciphertext);
    blob
}

fn decode_blob(blob: &[u8]) -> Result<Blob<'_>, KmsError> {
    let [format, id_len, rest @ ..] = blob else {
        return Err(KmsError::InvalidCiphertext);
    };
    if *format != BLOB_FORMAT {
        return Err(KmsError::InvalidCiphertext);
    }
    let id_len = *id_len as usize;
    if rest.len() < id_len + NONCE_LEN + aead::TAG_LEN {
        return Err(KmsError::InvalidCiphertext);
    }
    let (id, rest) = rest.split_at(id_len);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    Ok(Blob {
        key_id: std::str::from_utf8(id).map_err(|_| KmsError::InvalidCiphertext)?,
        nonce: nonce.try_into().map_err(|_| KmsError::InvalidCiphertext)?,
        ciphertext,
    })
}

#[async_trait]
impl KeyManagement for LocalKms {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate_data_key(
        &self,
        key_id: &str,
        context: &EncryptionContext,
        num_bytes: usize,
    ) -> Result<DataKey, KmsError> {
        if validate_key_id(key_id).is_err() {
            return Err(KmsError::KeyNotFound {
                key_id: key_id.to_string(),
            });
        }
        let key = self.load_key(key_id).await?;
        let plaintext = aead::random_bytes(num_bytes).map_err(|e| KmsError::Backend(Box::new(e)))?;
        let (ciphertext, nonce) = aead::seal(&key, &plaintext, &context.canonical_bytes())
            .map_err(|e| KmsError::Backend(Box::new(e)))?;

        debug!(key_id, num_bytes, "data key generated");
        Ok(DataKey {
            plaintext,
            wrapped: encode_blob(key_id, &nonce, &ciphertext),
        })
    }

    async fn decrypt(
        &self,
        wrapped: &[u8],
        context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, KmsError> {
        let blob = decode_blob(wrapped)?;
        let key = self.load_key(blob.key_id).await?;
        aead::open(&key, &blob.nonce, blob.ciphertext, &context.canonical_bytes())
            .map_err(|_| KmsError::InvalidCiphertext)
    }
}
