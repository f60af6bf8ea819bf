// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Credvault credential store.
//!
//! TOML files are merged with environment overrides, rejected on unknown
//! keys, validated, and reported as miette diagnostics with typo hints.
//!
//! ```no_run
//! use credvault_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("database: {}", config.storage.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_str};
pub use model::{CredvaultConfig, GeneralConfig, KmsConfig, RetrievalConfig, StorageConfig};

/// Load configuration from every layer (plus `explicit`, if given) and validate it.
pub fn load_and_validate(explicit: Option<&Path>) -> Result<CredvaultConfig, Vec<ConfigError>> {
    match loader::load_config(explicit) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = collect_toml_sources(explicit);
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Parse and validate a TOML string on top of the defaults.
pub fn load_and_validate_str(toml_content: &str) -> Result<CredvaultConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Contents of the config files that exist, keyed by the path figment reports.
fn collect_toml_sources(explicit: Option<&Path>) -> Vec<(String, String)> {
    loader::config_file_layers(explicit)
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let resolved = if path.is_relative() {
                std::env::current_dir()
                    .map(|dir| dir.join(&path))
                    .unwrap_or(path)
            } else {
                path
            };
            Some((resolved.display().to_string(), content))
        })
        .collect()
}
