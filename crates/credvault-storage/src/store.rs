// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the key-value store capability.

use async_trait::async_trait;
use credvault_core::{ItemKey, KeyValueStore, MacAttribute, RangeQuery, SecretItem, StoreError};
use rusqlite::types::{Type, Value, ValueRef};
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

use crate::database::{Database, map_tr_err};

const SELECT_ITEM: &str = "SELECT name, version, key, contents, hmac FROM credentials";

/// Credential items in the `credentials` table.
///
/// Reads are always consistent, so [`RangeQuery::consistent`] needs no
/// special handling.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn mac_to_sql(mac: MacAttribute) -> Value {
    match mac {
        MacAttribute::Text(hex) => Value::Text(hex),
        MacAttribute::Binary(bytes) => Value::Blob(bytes),
    }
}

fn mac_from_sql(row: &Row<'_>, idx: usize) -> rusqlite::Result<MacAttribute> {
    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map(MacAttribute::Text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        ValueRef::Blob(bytes) => Ok(MacAttribute::Binary(bytes.to_vec())),
        other => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "hmac".to_string(),
            other.data_type(),
        )),
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<SecretItem> {
    Ok(SecretItem {
        name: row.get(0)?,
        version: row.get(1)?,
        key: row.get(2)?,
        contents: row.get(3)?,
        hmac: mac_from_sql(row, 4)?,
    })
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get_item(&self, key: &ItemKey) -> Result<Option<SecretItem>, StoreError> {
        let ItemKey { name, version } = key.clone();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<SecretItem>, rusqlite::Error> {
                conn.query_row(
                    &format!("{SELECT_ITEM} WHERE name = ?1 AND version = ?2"),
                    params![name, version],
                    row_to_item,
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn put_if_absent(&self, item: SecretItem) -> Result<(), StoreError> {
        let inserted = self
            .db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO credentials (name, version, key, contents, hmac)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        item.name,
                        item.version,
                        item.key,
                        item.contents,
                        mac_to_sql(item.hmac)
                    ],
                )
            })
            .await
            .map_err(map_tr_err)?;

        if inserted == 0 {
            return Err(StoreError::ConditionalCheckFailed);
        }
        Ok(())
    }

    async fn delete_item(&self, key: &ItemKey) -> Result<(), StoreError> {
        let ItemKey { name, version } = key.clone();
        let deleted = self
            .db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM credentials WHERE name = ?1 AND version = ?2",
                    params![name, version],
                )
            })
            .await
            .map_err(map_tr_err)?;
        debug!(name = %key.name, deleted, "delete_item");
        Ok(())
    }

    async fn query(&self, query: &RangeQuery) -> Result<Vec<SecretItem>, StoreError> {
        let name = query.name.clone();
        let order = if query.descending { "DESC" } else { "ASC" };
        // SQLite treats a negative LIMIT as unbounded.
        let limit = query
            .limit
            .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let sql = format!("{SELECT_ITEM} WHERE name = ?1 ORDER BY version {order} LIMIT ?2");
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<SecretItem>, rusqlite::Error> {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![name, limit], row_to_item)?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn scan_keys(&self) -> Result<Vec<ItemKey>, StoreError> {
        self.db
            .connection()
            .call(|conn| -> Result<Vec<ItemKey>, rusqlite::Error> {
                let mut stmt =
                    conn.prepare("SELECT name, version FROM credentials ORDER BY name, version")?;
                let rows = stmt.query_map([], |row| {
                    Ok(ItemKey {
                        name: row.get(0)?,
                        version: row.get(1)?,
                    })
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::new(Database::open_in_memory().await.unwrap())
    }

    fn item(name: &str, version: &str, mac: MacAttribute) -> SecretItem {
        SecretItem {
            name: name.to_string(),
            version: version.to_string(),
            key: "d3JhcHBlZA==".to_string(),
            contents: "Y2lwaGVy".to_string(),
            hmac: mac,
        }
    }

    fn text_mac() -> MacAttribute {
        MacAttribute::Text("ab".repeat(32))
    }

    #[tokio::test]
    async fn put_and_get_round_trip() {
        let store = store().await;
        let original = item("db", "0000000000000000001", text_mac());
        store.put_if_absent(original.clone()).await.unwrap();

        let fetched = store
            .get_item(&original.item_key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, original);
        assert!(
            store
                .get_item(&ItemKey::new("db", "0000000000000000002"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_put_is_conditional_failure() {
        let store = store().await;
        store
            .put_if_absent(item("db", "0000000000000000001", text_mac()))
            .await
            .unwrap();

        let mut replacement = item("db", "0000000000000000001", text_mac());
        replacement.contents = "b3RoZXI=".to_string();
        let err = store.put_if_absent(replacement).await.unwrap_err();
        assert!(matches!(err, StoreError::ConditionalCheckFailed));

        let kept = store
            .get_item(&ItemKey::new("db", "0000000000000000001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.contents, "Y2lwaGVy");
    }

    #[tokio::test]
    async fn binary_mac_keeps_its_storage_class() {
        let store = store().await;
        let bytes = "cd".repeat(32).into_bytes();
        store
            .put_if_absent(item("db", "0000000000000000001", MacAttribute::Binary(bytes.clone())))
            .await
            .unwrap();

        let fetched = store
            .get_item(&ItemKey::new("db", "0000000000000000001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.hmac, MacAttribute::Binary(bytes));
    }

    #[tokio::test]
    async fn query_orders_and_limits() {
        let store = store().await;
        for v in ["0000000000000000002", "0000000000000000010", "0000000000000000001"] {
            store.put_if_absent(item("db", v, text_mac())).await.unwrap();
        }
        store
            .put_if_absent(item("other", "0000000000000000099", text_mac()))
            .await
            .unwrap();

        let latest = store.query(&RangeQuery::latest("db")).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].version, "0000000000000000010");

        let all: Vec<String> = store
            .query(&RangeQuery::all_versions("db"))
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.version)
            .collect();
        assert_eq!(
            all,
            vec![
                "0000000000000000001",
                "0000000000000000002",
                "0000000000000000010"
            ]
        );

        assert!(store.query(&RangeQuery::latest("none")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_scan_is_sorted() {
        let store = store().await;
        store.put_if_absent(item("b", "0000000000000000001", text_mac())).await.unwrap();
        store.put_if_absent(item("a", "0000000000000000002", text_mac())).await.unwrap();
        store.put_if_absent(item("a", "0000000000000000001", text_mac())).await.unwrap();

        let key = ItemKey::new("a", "0000000000000000002");
        store.delete_item(&key).await.unwrap();
        store.delete_item(&key).await.unwrap();

        let keys = store.scan_keys().await.unwrap();
        assert_eq!(
            keys,
            vec![
                ItemKey::new("a", "0000000000000000001"),
                ItemKey::new("b", "0000000000000000001"),
            ]
        );
    }
}
