// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::CredvaultConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &CredvaultConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.general.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "general.log_level `{}` is not one of {}",
                config.general.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.kms.default_key_id.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "kms.default_key_id must not be empty".to_string(),
        });
    }

    if config.kms.kdf_memory_cost < 32768 {
        errors.push(ConfigError::Validation {
            message: format!(
                "kms.kdf_memory_cost must be at least 32768 (32 MiB), got {}",
                config.kms.kdf_memory_cost
            ),
        });
    }

    if config.kms.kdf_iterations < 2 {
        errors.push(ConfigError::Validation {
            message: format!(
                "kms.kdf_iterations must be at least 2, got {}",
                config.kms.kdf_iterations
            ),
        });
    }

    if config.kms.kdf_parallelism < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "kms.kdf_parallelism must be at least 1, got {}",
                config.kms.kdf_parallelism
            ),
        });
    }

    if config.retrieval.max_concurrent_gets < 1 {
        errors.push(ConfigError::Validation {
            message: "retrieval.max_concurrent_gets must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
