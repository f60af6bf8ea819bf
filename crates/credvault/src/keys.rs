// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `credvault keys create|list`.

use credvault_config::CredvaultConfig;
use credvault_core::CredvaultError;

use crate::app;

pub async fn create(config: &CredvaultConfig, key_id: &str) -> Result<(), CredvaultError> {
    let db = app::open_database(config).await?;
    let kms = app::unlock_kms(&db).await?;
    kms.create_key(key_id).await?;
    println!("{key_id} has been created");
    Ok(())
}

pub async fn list(config: &CredvaultConfig) -> Result<(), CredvaultError> {
    let db = app::open_database(config).await?;
    let kms = app::unlock_kms(&db).await?;
    let keys = kms.list_keys().await?;

    let width = keys.iter().map(|k| k.key_id.len()).max().unwrap_or(0);
    for key in keys {
        println!("{:<width$} -- created {}", key.key_id, key.created_at);
    }
    Ok(())
}
