// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `credvault setup`: create the database, key ring and default wrapping key.
//!
//! Safe to re-run: an existing key ring is unlocked instead of replaced, and
//! the default key is only created if missing.

use credvault_config::CredvaultConfig;
use credvault_core::{CredvaultError, KmsError};
use credvault_kms::LocalKms;
use tracing::info;

use crate::app;

pub async fn run(config: &CredvaultConfig) -> Result<(), CredvaultError> {
    let db = app::open_database(config).await?;

    let kms = if LocalKms::exists(&db).await? {
        eprintln!("Key ring already initialized.");
        app::unlock_kms(&db).await?
    } else {
        let passphrase = credvault_kms::read_new_passphrase()?;
        let kms = LocalKms::create(&db, &passphrase, app::kdf_params(config)).await?;
        eprintln!("Key ring created.");
        kms
    };

    let key_id = &config.kms.default_key_id;
    match kms.create_key(key_id).await {
        Ok(()) => eprintln!("Created wrapping key `{key_id}`."),
        Err(CredvaultError::KeyManagement(KmsError::KeyExists { .. })) => {
            eprintln!("Wrapping key `{key_id}` already exists.");
        }
        Err(e) => return Err(e),
    }

    info!(database = %config.storage.database_path, "setup complete");
    println!("Credential store ready at {}", config.storage.database_path);
    Ok(())
}
