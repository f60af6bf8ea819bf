// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential commands: put, get, getall, delete and list.

use std::io::{Read, Write};
use std::path::Path;

use credvault_config::CredvaultConfig;
use credvault_core::{CredvaultError, EncryptionContext, ItemKey, KeyValueStore};
use credvault_crypto::codec::display_version;
use credvault_driver::{DEFAULT_VERSION, Lookup, MultiRetrieval, is_pattern};
use credvault_storage::SqliteStore;
use secrecy::ExposeSecret;

use crate::app;
use crate::{DeleteArgs, GetArgs, GetallArgs, PutArgs};

/// Drop one trailing line ending, as left by `echo` or a heredoc.
fn strip_newline(mut value: String) -> String {
    if value.ends_with('\n') {
        value.pop();
        if value.ends_with('\r') {
            value.pop();
        }
    }
    value
}

/// The value argument of `put`, reading stdin for `-`.
fn read_value(arg: &str) -> Result<String, CredvaultError> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| CredvaultError::Internal(format!("failed to read value from stdin: {e}")))?;
    Ok(strip_newline(buf))
}

pub async fn put(config: &CredvaultConfig, args: PutArgs) -> Result<(), CredvaultError> {
    let context = EncryptionContext::parse_pairs(&args.context)?;
    let value = read_value(&args.value)?;
    let key_id = args
        .key_id
        .as_deref()
        .unwrap_or(&config.kms.default_key_id);

    let driver = app::open_driver(config).await?;
    let version = if args.autoversion {
        driver
            .put_secret_auto(&args.name, &value, key_id, &context)
            .await?
    } else {
        let version = args
            .version
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        driver
            .put_secret(&args.name, &value, &version, key_id, &context)
            .await?
    };

    println!("{} has been stored (version {version})", args.name);
    Ok(())
}

/// Serialize a wildcard result, failing on the first error when `strict`.
fn render_document(result: MultiRetrieval, strict: bool) -> Result<String, CredvaultError> {
    let result = if strict {
        result.into_complete()?
    } else {
        result
    };
    let mut out = result.to_json()?;
    out.push('\n');
    Ok(out)
}

async fn fetch(config: &CredvaultConfig, args: &GetArgs) -> Result<String, CredvaultError> {
    let context = EncryptionContext::parse_pairs(&args.context)?;
    let driver = app::open_driver(config).await?;
    match driver
        .lookup(&args.name, args.version.as_deref(), &context)
        .await?
    {
        Lookup::Single(value) => {
            let mut out = value.expose_secret().to_string();
            if !args.no_newline {
                out.push('\n');
            }
            Ok(out)
        }
        Lookup::Many(result) => {
            render_document(result, args.strict || config.retrieval.strict_wildcard)
        }
    }
}

fn append_error(path: &Path, name: &str, error: &CredvaultError) {
    let written = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| writeln!(file, "error: credvault get {name}: {error}"));
    if let Err(e) = written {
        tracing::warn!(path = %path.display(), error = %e, "could not write error file");
    }
}

pub async fn get(config: &CredvaultConfig, args: GetArgs) -> Result<(), CredvaultError> {
    match fetch(config, &args).await {
        Ok(out) => {
            print!("{out}");
            Ok(())
        }
        Err(e) => {
            if let Some(path) = &args.error_out {
                append_error(path, &args.name, &e);
            }
            // Silencing applies to single lookups; pattern lookups already
            // tolerate per-name failures unless strict.
            if args.silent && !is_pattern(&args.name) {
                return Ok(());
            }
            Err(e)
        }
    }
}

pub async fn getall(config: &CredvaultConfig, args: GetallArgs) -> Result<(), CredvaultError> {
    let context = EncryptionContext::parse_pairs(&args.context)?;
    let driver = app::open_driver(config).await?;
    let result = driver.get_all(args.version.as_deref(), &context).await?;
    print!(
        "{}",
        render_document(result, args.strict || config.retrieval.strict_wildcard)?
    );
    Ok(())
}

pub async fn delete(config: &CredvaultConfig, args: DeleteArgs) -> Result<(), CredvaultError> {
    let driver = app::open_driver(config).await?;
    driver
        .delete_secrets(&args.name, args.version.as_deref(), |key| {
            eprintln!(
                "Deleting {} -- version {}",
                key.name,
                display_version(&key.version)
            );
        })
        .await?;
    Ok(())
}

/// One aligned line per stored `(name, version)`.
fn format_listing(keys: &[ItemKey]) -> Vec<String> {
    let width = keys.iter().map(|k| k.name.chars().count()).max().unwrap_or(0);
    keys.iter()
        .map(|k| {
            format!(
                "{:<width$} -- version {}",
                k.name,
                display_version(&k.version)
            )
        })
        .collect()
}

/// Listing reads names and versions only, so the key ring stays locked.
pub async fn list(config: &CredvaultConfig) -> Result<(), CredvaultError> {
    let store = SqliteStore::new(app::open_database(config).await?);
    let mut keys = store.scan_keys().await?;
    keys.sort();
    for line in format_listing(&keys) {
        println!("{line}");
    }
    Ok(())
}
