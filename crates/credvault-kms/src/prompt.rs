// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key ring passphrase from `CREDVAULT_KMS_PASSPHRASE` or a TTY prompt.

use std::io::IsTerminal;

use credvault_core::CredvaultError;
use secrecy::SecretString;

pub const PASSPHRASE_ENV_VAR: &str = "CREDVAULT_KMS_PASSPHRASE";

fn from_env() -> Option<SecretString> {
    std::env::var(PASSPHRASE_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn read(prompt: &str) -> Result<String, CredvaultError> {
    eprint!("{prompt}");
    rpassword::read_password()
        .map_err(|e| CredvaultError::Config(format!("failed to read passphrase: {e}")))
}

fn unavailable() -> CredvaultError {
    CredvaultError::Config(format!(
        "no key ring passphrase provided: set {PASSPHRASE_ENV_VAR} or run interactively"
    ))
}

/// Passphrase to unlock an existing key ring.
pub fn read_passphrase() -> Result<SecretString, CredvaultError> {
    if let Some(passphrase) = from_env() {
        return Ok(passphrase);
    }
    if !std::io::stdin().is_terminal() {
        return Err(unavailable());
    }
    let passphrase = read("Key ring passphrase: ")?;
    if passphrase.is_empty() {
        return Err(CredvaultError::Config("empty passphrase not allowed".to_string()));
    }
    Ok(SecretString::from(passphrase))
}

/// Passphrase for a new key ring. Interactive entry is asked twice.
pub fn read_new_passphrase() -> Result<SecretString, CredvaultError> {
    if let Some(passphrase) = from_env() {
        return Ok(passphrase);
    }
    if !std::io::stdin().is_terminal() {
        return Err(unavailable());
    }
    let first = zeroize::Zeroizing::new(read("New key ring passphrase: ")?);
    let second = zeroize::Zeroizing::new(read("Confirm key ring passphrase: ")?);
    if *first != *second {
        return Err(CredvaultError::Config("passphrases do not match".to_string()));
    }
    if first.is_empty() {
        return Err(CredvaultError::Config("empty passphrase not allowed".to_string()));
    }
    Ok(SecretString::from(first.to_string()))
}
