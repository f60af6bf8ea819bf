// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management: PRAGMA setup, WAL mode and migrations.
//!
//! All statements run on tokio-rusqlite's single background thread. Clones
//! of [`Database::connection`] share that thread.

use std::path::Path;
use std::time::Duration;

use credvault_core::{BoxError, StoreError};
use tracing::info;

use crate::migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// An open, migrated credential database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (creating if needed) the database at `path` and apply migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Backend(Box::new(e)))?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        let db = Self::initialize(conn, wal_mode).await?;
        info!(path, wal_mode, "credential database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Used by tests.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        Self::initialize(conn, false).await
    }

    async fn initialize(conn: tokio_rusqlite::Connection, wal_mode: bool) -> Result<Self, StoreError> {
        conn.call(move |conn| -> Result<(), BoxError> {
            if wal_mode {
                let _mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
            }
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(map_boxed_err)?;
        Ok(Self { conn })
    }

    /// The shared connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), StoreError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        self.conn
            .close()
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))
    }
}

/// Convert a tokio-rusqlite error into a backend store error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> StoreError {
    StoreError::Backend(Box::new(e))
}

fn map_boxed_err(e: tokio_rusqlite::Error<BoxError>) -> StoreError {
    match e {
        tokio_rusqlite::Error::Error(inner) => StoreError::Backend(inner),
        other => StoreError::Backend(other.to_string().into()),
    }
}
