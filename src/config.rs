//! # src/config.rs
//!
//! Konfiguration des Clients: Netzwerk, Vertragspaket, Typnamen, Polling- und
//! Bestätigungsparameter sowie die optionale Allow-List. Wird aus TOML geladen;
//! jedes Feld hat einen Standardwert.

use crate::models::identifier::{Address, IdentifierError, ObjectId};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Das veröffentlichte Vertragspaket im Testnetz.
pub const DEFAULT_PACKAGE_ID: &str =
    "0xe0152c8b3cae3b7f28e5d93235d9cb658dec3f694d89851894c87abe09e38124";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid identifier in configuration field '{field}': {source}")]
    InvalidIdentifier {
        field: &'static str,
        #[source]
        source: IdentifierError,
    },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Polling-Parameter für die automatische Aktualisierung der Zeitleiste.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 3_000 }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Backoff-Parameter für das Warten auf Transaktionseffekte.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConfirmationConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl ConfirmationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
            jitter: self.jitter,
        }
    }
}

/// Die vollständige Client-Konfiguration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub network: String,
    pub package_id: String,
    pub module_name: String,
    pub batch_type_name: String,
    pub record_type_name: String,
    pub gas_budget: u64,
    pub clock_object_id: String,
    pub polling: PollingConfig,
    pub confirmation: ConfirmationConfig,
    /// Leere Liste: keine Einschränkung.
    pub allowed_wallets: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: "testnet".to_string(),
            package_id: DEFAULT_PACKAGE_ID.to_string(),
            module_name: "supply_chain".to_string(),
            batch_type_name: "MedicineBatch".to_string(),
            record_type_name: "StatusRecord".to_string(),
            gas_budget: 200_000_000,
            clock_object_id: "0x6".to_string(),
            polling: PollingConfig::default(),
            confirmation: ConfirmationConfig::default(),
            allowed_wallets: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Parst und validiert eine Konfiguration aus einem TOML-String.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Lädt eine Konfiguration aus einer TOML-Datei.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.package()?;
        self.clock_object()?;
        self.allowed_addresses()?;
        if self.module_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "module_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.confirmation.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "confirmation.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.confirmation.multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "confirmation.multiplier",
                reason: "must be at least 1.0".to_string(),
            });
        }
        Ok(())
    }

    pub fn package(&self) -> Result<ObjectId, ConfigError> {
        ObjectId::parse(&self.package_id).map_err(|source| ConfigError::InvalidIdentifier {
            field: "package_id",
            source,
        })
    }

    pub fn clock_object(&self) -> Result<ObjectId, ConfigError> {
        ObjectId::from_short_hex(&self.clock_object_id).map_err(|source| {
            ConfigError::InvalidIdentifier {
                field: "clock_object_id",
                source,
            }
        })
    }

    pub fn allowed_addresses(&self) -> Result<Vec<Address>, ConfigError> {
        self.allowed_wallets
            .iter()
            .map(|raw| {
                Address::parse(raw).map_err(|source| ConfigError::InvalidIdentifier {
                    field: "allowed_wallets",
                    source,
                })
            })
            .collect()
    }

    /// Voller Typname eines Vertragstyps, z.B. `0x…::supply_chain::MedicineBatch`.
    pub fn qualified_type(&self, type_name: &str) -> Result<String, ConfigError> {
        Ok(format!("{}::{}::{}", self.package()?, self.module_name, type_name))
    }
}
