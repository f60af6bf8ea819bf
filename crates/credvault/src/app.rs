// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the database, key ring and driver shared by every command.

use std::sync::Arc;

use credvault_config::CredvaultConfig;
use credvault_core::CredvaultError;
use credvault_driver::Driver;
use credvault_kms::{KdfParams, LocalKms};
use credvault_storage::{Database, SqliteStore};

pub async fn open_database(config: &CredvaultConfig) -> Result<Database, CredvaultError> {
    Ok(Database::open(&config.storage.database_path, config.storage.wal_mode).await?)
}

pub fn kdf_params(config: &CredvaultConfig) -> KdfParams {
    KdfParams {
        memory_cost: config.kms.kdf_memory_cost,
        iterations: config.kms.kdf_iterations,
        parallelism: config.kms.kdf_parallelism,
    }
}

/// Unlock the key ring, prompting for the passphrase if needed.
pub async fn unlock_kms(db: &Database) -> Result<LocalKms, CredvaultError> {
    if !LocalKms::exists(db).await? {
        return Err(CredvaultError::Config(
            "no key ring found: run `credvault setup` first".to_string(),
        ));
    }
    let passphrase = credvault_kms::read_passphrase()?;
    LocalKms::unlock(db, &passphrase).await
}

/// Open the database, unlock the key ring and build a driver over both.
pub async fn open_driver(config: &CredvaultConfig) -> Result<Driver, CredvaultError> {
    let db = open_database(config).await?;
    let kms = unlock_kms(&db).await?;
    Ok(build_driver(config, db, kms))
}

pub fn build_driver(config: &CredvaultConfig, db: Database, kms: LocalKms) -> Driver {
    Driver::new(Arc::new(SqliteStore::new(db)), Arc::new(kms))
        .with_max_concurrent_gets(config.retrieval.max_concurrent_gets)
}
