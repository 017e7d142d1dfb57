//! # tests/test_config.rs
//!
//! Laden und Prüfen der TOML-Konfiguration.

use medtrack_lib::config::{ConfigError, DEFAULT_PACKAGE_ID};
use medtrack_lib::ClientConfig;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_defaults_are_valid() {
    let config = ClientConfig::default();
    config.validate().unwrap();

    assert_eq!(config.package_id, DEFAULT_PACKAGE_ID);
    assert_eq!(config.module_name, "supply_chain");
    assert_eq!(config.polling.interval(), Duration::from_secs(3));
    assert_eq!(config.confirmation.max_attempts, 6);
    assert!(config.allowed_wallets.is_empty());
    assert_eq!(
        config.clock_object().unwrap().to_string(),
        format!("0x{:0>64}", "6")
    );
    assert!(config
        .qualified_type("MedicineBatch")
        .unwrap()
        .ends_with("::supply_chain::MedicineBatch"));
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = ClientConfig::from_toml_str(
        r#"
        network = "devnet"

        [polling]
        interval_ms = 500

        [confirmation]
        max_attempts = 10
        "#,
    )
    .unwrap();

    assert_eq!(config.network, "devnet");
    assert_eq!(config.polling.interval_ms, 500);
    assert_eq!(config.confirmation.max_attempts, 10);
    assert_eq!(config.confirmation.initial_delay_ms, 500);
    assert_eq!(config.package_id, DEFAULT_PACKAGE_ID);
}

#[test]
fn test_load_from_file() {
    let wallet = "a".repeat(64);
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "module_name = \"pharma_chain\"").unwrap();
    writeln!(file, "allowed_wallets = [\"0x{}\"]", wallet).unwrap();

    let config = ClientConfig::load(file.path()).unwrap();
    assert_eq!(config.module_name, "pharma_chain");
    let allowed = config.allowed_addresses().unwrap();
    assert_eq!(allowed.len(), 1);
    assert_eq!(allowed[0].as_str(), wallet);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClientConfig::load(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(matches!(
        ClientConfig::from_toml_str("package_id = \"0x123\""),
        Err(ConfigError::InvalidIdentifier {
            field: "package_id",
            ..
        })
    ));
    assert!(matches!(
        ClientConfig::from_toml_str("allowed_wallets = [\"not-a-wallet\"]"),
        Err(ConfigError::InvalidIdentifier {
            field: "allowed_wallets",
            ..
        })
    ));
    assert!(matches!(
        ClientConfig::from_toml_str("[polling]\ninterval_ms = 0"),
        Err(ConfigError::InvalidValue {
            field: "polling.interval_ms",
            ..
        })
    ));
    assert!(matches!(
        ClientConfig::from_toml_str("[confirmation]\nmultiplier = 0.5"),
        Err(ConfigError::InvalidValue {
            field: "confirmation.multiplier",
            ..
        })
    ));
    assert!(matches!(
        ClientConfig::from_toml_str("module_name = [1, 2"),
        Err(ConfigError::Parse(_))
    ));
}
