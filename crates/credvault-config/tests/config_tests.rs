// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Credvault configuration system.

use credvault_config::diagnostic::ConfigError;
use credvault_config::{load_and_validate, load_and_validate_str, load_config, load_config_from_str};
use figment::Jail;

#[test]
fn valid_toml_deserializes_every_section() {
    let toml = r#"
[general]
log_level = "debug"

[storage]
database_path = "/tmp/creds.db"
wal_mode = false

[kms]
default_key_id = "payments"
kdf_memory_cost = 32768
kdf_iterations = 2
kdf_parallelism = 1

[retrieval]
max_concurrent_gets = 3
strict_wildcard = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/creds.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.kms.default_key_id, "payments");
    assert_eq!(config.kms.kdf_memory_cost, 32768);
    assert_eq!(config.kms.kdf_iterations, 2);
    assert_eq!(config.kms.kdf_parallelism, 1);
    assert_eq!(config.retrieval.max_concurrent_gets, 3);
    assert!(config.retrieval.strict_wildcard);
}

#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.general.log_level, "info");
    assert!(config.storage.database_path.ends_with("credvault.db"));
    assert!(config.storage.wal_mode);
    assert_eq!(config.kms.default_key_id, "credvault");
    assert_eq!(config.kms.kdf_memory_cost, 65536);
    assert_eq!(config.kms.kdf_iterations, 3);
    assert_eq!(config.kms.kdf_parallelism, 4);
    assert_eq!(config.retrieval.max_concurrent_gets, 8);
    assert!(!config.retrieval.strict_wildcard);
}

#[test]
fn unknown_key_gets_suggestion_and_valid_keys() {
    let toml = r#"
[kms]
default_keyid = "x"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "default_keyid"
                && suggestion.as_deref() == Some("default_key_id")
                && valid_keys.contains("kdf_iterations")
        })
    });
    assert!(found, "expected UnknownKey with suggestion, got: {errors:?}");
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = r#"
[dynamodb]
table = "credential-store"
"#;
    let err = load_config_from_str(toml).expect_err("unknown section should be rejected");
    let err_str = err.to_string();
    assert!(
        err_str.contains("unknown field") || err_str.contains("dynamodb"),
        "got: {err_str}"
    );
}

#[test]
fn invalid_type_is_reported_with_key_path() {
    let toml = r#"
[retrieval]
max_concurrent_gets = "many"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::InvalidType { key, .. } if key.contains("max_concurrent_gets")
        )),
        "got: {errors:?}"
    );
}

#[test]
fn validation_errors_surface_through_loader() {
    let toml = r#"
[general]
log_level = "loud"

[retrieval]
max_concurrent_gets = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2, "got: {errors:?}");
}

#[test]
fn unknown_key_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "wal_mod".to_string(),
        suggestion: Some("wal_mode".to_string()),
        valid_keys: "database_path, wal_mode".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `wal_mode`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("wal_mod"));
}

#[test]
fn env_vars_override_files_with_underscored_keys() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "credvault.toml",
            r#"
[kms]
default_key_id = "from-file"

[storage]
database_path = "from-file.db"
"#,
        )?;
        jail.set_env("CREDVAULT_KMS_DEFAULT_KEY_ID", "from-env");
        jail.set_env("CREDVAULT_RETRIEVAL_MAX_CONCURRENT_GETS", "2");

        let config = load_config(None)?;
        assert_eq!(config.kms.default_key_id, "from-env");
        assert_eq!(config.retrieval.max_concurrent_gets, 2);
        assert_eq!(config.storage.database_path, "from-file.db");
        Ok(())
    });
}

#[test]
fn explicit_config_file_overrides_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file("credvault.toml", "[general]\nlog_level = \"warn\"\n")?;
        jail.create_file(
            "override.toml",
            "[general]\nlog_level = \"debug\"\n",
        )?;

        let path = jail.directory().join("override.toml");
        let config = load_config(Some(&path))?;
        assert_eq!(config.general.log_level, "debug");
        Ok(())
    });
}

#[test]
fn load_and_validate_reports_file_errors() {
    Jail::expect_with(|jail| {
        jail.create_file("credvault.toml", "[storage]\ndatabse_path = \"x.db\"\n")?;

        let errors = load_and_validate(None).expect_err("typo should be rejected");
        let found = errors.iter().any(|e| {
            matches!(e, ConfigError::UnknownKey { key, suggestion, .. }
                if key == "databse_path" && suggestion.as_deref() == Some("database_path"))
        });
        assert!(found, "got: {errors:?}");
        Ok(())
    });
}

#[test]
fn missing_explicit_file_is_skipped() {
    Jail::expect_with(|_jail| {
        let config = load_config(Some(std::path::Path::new("/nonexistent/credvault.toml")))?;
        assert_eq!(config.kms.default_key_id, "credvault");
        Ok(())
    });
}

#[test]
fn non_config_credvault_variables_do_not_break_loading() {
    Jail::expect_with(|jail| {
        jail.set_env("CREDVAULT_KMS_PASSPHRASE", "pw");
        jail.set_env("CREDVAULT_GET_NO_NEWLINE", "1");
        jail.set_env("CREDVAULT_GET_ERROUT", "/tmp/credvault-errors.log");
        jail.set_env("CREDVAULT_KMS_KDF_ITERATIONS", "5");

        let config = load_and_validate(None).map_err(|errors| format!("{errors:?}"))?;
        assert_eq!(config.kms.kdf_iterations, 5);
        assert_eq!(config.kms.default_key_id, "credvault");
        Ok(())
    });
}
