// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with figment.
//!
//! Merge order, later layers winning:
//! 1. compiled defaults
//! 2. `/etc/credvault/credvault.toml`
//! 3. `$XDG_CONFIG_HOME/credvault/credvault.toml`
//! 4. `./credvault.toml`
//! 5. an explicit file given with `--config`
//! 6. `CREDVAULT_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CredvaultConfig;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/credvault/credvault.toml";
pub const LOCAL_CONFIG_PATH: &str = "credvault.toml";

/// Keys that `CREDVAULT_<SECTION>_<KEY>` variables map into.
///
/// Other `CREDVAULT_*` variables (the key ring passphrase, `get` flags) are
/// read elsewhere and never reach the config model.
const ENV_KEYS: &[(&str, &[&str])] = &[
    ("general", &["log_level"]),
    ("storage", &["database_path", "wal_mode"]),
    (
        "kms",
        &[
            "default_key_id",
            "kdf_memory_cost",
            "kdf_iterations",
            "kdf_parallelism",
        ],
    ),
    ("retrieval", &["max_concurrent_gets", "strict_wildcard"]),
];

/// The per-user config file, if a config directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("credvault").join("credvault.toml"))
}

/// Every file layer in merge order.
pub fn config_file_layers(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut layers = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    layers.extend(user_config_path());
    layers.push(PathBuf::from(LOCAL_CONFIG_PATH));
    layers.extend(explicit.map(Path::to_path_buf));
    layers
}

/// The full figment before extraction. Missing files are skipped.
pub fn build_figment(explicit: Option<&Path>) -> Figment {
    config_file_layers(explicit)
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(CredvaultConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Load configuration from every layer.
pub fn load_config(explicit: Option<&Path>) -> Result<CredvaultConfig, figment::Error> {
    build_figment(explicit).extract()
}

/// Load configuration from defaults plus one TOML string. No files or
/// environment are consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<CredvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CredvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Map an unprefixed variable name to its `section.key` path, or `None` if
/// it is not a configuration key.
pub fn env_key_path(var: &str) -> Option<String> {
    let var = var.to_ascii_lowercase();
    ENV_KEYS.iter().find_map(|(section, keys)| {
        let field = var.strip_prefix(section)?.strip_prefix('_')?;
        keys.contains(&field).then(|| format!("{section}.{field}"))
    })
}

/// Environment provider with an explicit section mapping.
///
/// `Env::split("_")` would turn `CREDVAULT_KMS_DEFAULT_KEY_ID` into
/// `kms.default.key.id`; only the first underscore after a known section
/// name is a separator.
fn env_provider() -> Env {
    Env::prefixed("CREDVAULT_").filter_map(|key| env_key_path(key.as_str()).map(Into::into))
}
