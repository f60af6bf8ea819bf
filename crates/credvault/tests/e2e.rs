// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests over the production stack: SQLite store, local key ring
//! and driver, sharing one database file.

use std::sync::Arc;

use credvault_core::{CredvaultError, EncryptionContext, MacAttribute};
use credvault_crypto::codec::format_version;
use credvault_driver::{Driver, Lookup};
use credvault_kms::{KdfParams, LocalKms};
use credvault_storage::{Database, SqliteStore};
use secrecy::{ExposeSecret, SecretString};
use tempfile::TempDir;

const KEY_ID: &str = "credvault";

const FAST: KdfParams = KdfParams {
    memory_cost: 32768,
    iterations: 2,
    parallelism: 1,
};

struct Stack {
    driver: Driver,
    db: Database,
    _dir: TempDir,
}

async fn stack() -> Stack {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credvault.db");
    let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
    let kms = LocalKms::create(&db, &SecretString::from("pw".to_string()), FAST)
        .await
        .unwrap();
    kms.create_key(KEY_ID).await.unwrap();
    let driver = Driver::new(Arc::new(SqliteStore::new(db.clone())), Arc::new(kms));
    Stack {
        driver,
        db,
        _dir: dir,
    }
}

fn none() -> EncryptionContext {
    EncryptionContext::new()
}

#[tokio::test]
async fn put_get_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credvault.db");
    let path = path.to_str().unwrap();
    let context: EncryptionContext = [("env", "prod")].into_iter().collect();

    {
        let db = Database::open(path, true).await.unwrap();
        let kms = LocalKms::create(&db, &SecretString::from("pw".to_string()), FAST)
            .await
            .unwrap();
        kms.create_key(KEY_ID).await.unwrap();
        let driver = Driver::new(Arc::new(SqliteStore::new(db.clone())), Arc::new(kms));
        driver
            .put_secret("db-prod", "p@ss", "1", KEY_ID, &context)
            .await
            .unwrap();
        drop(driver);
        db.close().await.unwrap();
    }

    let db = Database::open(path, true).await.unwrap();
    let kms = LocalKms::unlock(&db, &SecretString::from("pw".to_string()))
        .await
        .unwrap();
    let driver = Driver::new(Arc::new(SqliteStore::new(db)), Arc::new(kms));
    let value = driver.get_secret("db-prod", None, &context).await.unwrap();
    assert_eq!(value.expose_secret(), "p@ss");
}

#[tokio::test]
async fn stored_row_uses_compatible_attribute_encoding() {
    let s = stack().await;
    s.driver
        .put_secret("api-key", "abc", "7", KEY_ID, &none())
        .await
        .unwrap();

    let (version, hmac_type, hmac): (String, String, String) = s
        .db
        .connection()
        .call(|conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                "SELECT version, typeof(hmac), hmac FROM credentials WHERE name = 'api-key'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
        })
        .await
        .unwrap();
    assert_eq!(version, format_version(7));
    assert_eq!(hmac_type, "text");
    assert_eq!(hmac.len(), 64);
    assert!(hmac.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn binary_mac_rows_from_other_clients_decrypt() {
    let s = stack().await;
    s.driver
        .put_secret("legacy", "old-value", "1", KEY_ID, &none())
        .await
        .unwrap();

    // Rewrite the MAC as a blob holding the same hex ASCII.
    s.db.connection()
        .call(|conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE credentials SET hmac = CAST(hmac AS BLOB) WHERE name = 'legacy'",
                [],
            )
        })
        .await
        .unwrap();

    let store = SqliteStore::new(s.db.clone());
    let item = credvault_core::KeyValueStore::get_item(
        &store,
        &credvault_core::ItemKey::new("legacy", format_version(1)),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(matches!(item.hmac, MacAttribute::Binary(_)));

    let value = s.driver.get_secret("legacy", None, &none()).await.unwrap();
    assert_eq!(value.expose_secret(), "old-value");
}

#[tokio::test]
async fn version_conflict_and_ordering_over_sqlite() {
    let s = stack().await;
    for v in 1..=11u64 {
        s.driver
            .put_secret("svc", &format!("v{v}"), &v.to_string(), KEY_ID, &none())
            .await
            .unwrap();
    }

    let err = s
        .driver
        .put_secret("svc", "dup", "3", KEY_ID, &none())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CredvaultError::VersionAlreadyExists {
            current_highest: 11,
            ..
        }
    ));

    assert_eq!(s.driver.highest_version("svc").await.unwrap(), 11);
    let latest = s.driver.get_secret("svc", None, &none()).await.unwrap();
    assert_eq!(latest.expose_secret(), "v11");
    assert_eq!(
        s.driver
            .put_secret_auto("svc", "v12", KEY_ID, &none())
            .await
            .unwrap(),
        12
    );
}

#[tokio::test]
async fn wildcard_and_delete_over_sqlite() {
    let s = stack().await;
    let prod: EncryptionContext = [("env", "prod")].into_iter().collect();
    s.driver
        .put_secret("db-prod", "prod-pass", "1", KEY_ID, &prod)
        .await
        .unwrap();
    s.driver
        .put_secret("db-staging", "staging-pass", "1", KEY_ID, &prod)
        .await
        .unwrap();
    s.driver
        .put_secret("api-key", "api", "1", KEY_ID, &prod)
        .await
        .unwrap();

    match s.driver.lookup("db-*", None, &prod).await.unwrap() {
        Lookup::Many(result) => {
            assert!(result.is_complete());
            let json: serde_json::Value =
                serde_json::from_str(&result.to_json().unwrap()).unwrap();
            assert_eq!(
                json,
                serde_json::json!({"db-prod": "prod-pass", "db-staging": "staging-pass"})
            );
        }
        Lookup::Single(_) => panic!("pattern should produce a document"),
    }

    // Without the context every match fails, but the lookup itself succeeds.
    let result = s.driver.get_matching("db-*", None, &none()).await.unwrap();
    assert!(result.secrets.is_empty());
    assert_eq!(result.failures.len(), 2);

    let mut deleted = Vec::new();
    s.driver
        .delete_secrets("db-prod", None, |key| deleted.push(key.name.clone()))
        .await
        .unwrap();
    assert_eq!(deleted, vec!["db-prod"]);

    let names: Vec<String> = s.driver.list_names().await.unwrap().into_iter().collect();
    assert_eq!(names, vec!["api-key", "db-staging"]);
}

#[tokio::test]
async fn unknown_wrapping_key_surfaces_as_key_management_error() {
    let s = stack().await;
    let err = s
        .driver
        .put_secret("x", "v", "1", "no-such-key", &none())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CredvaultError::KeyManagement(credvault_core::KmsError::KeyNotFound { .. })
    ));
    assert!(s.driver.list_secrets().await.unwrap().is_empty());
}
