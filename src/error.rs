//! # src/error.rs
//!
//! Definiert den zentralen Fehlertyp für die gesamte medtrack_core-Bibliothek.
//! Verwendet `thiserror` zur einfachen Erstellung von aussagekräftigen Fehlern
//! und zur automatischen Konvertierung von untergeordneten Fehlertypen.

use crate::authorization::AuthorizationError;
use crate::config::ConfigError;
use crate::ledger::LedgerError;
use crate::models::identifier::IdentifierError;
use crate::services::crypto_utils::{DecryptionError, EncryptionError};
use crate::services::input_validation::InputValidationError;
use crate::services::order_flows::FlowError;
use crate::services::record_codec::MalformedEnvelopeError;
use crate::services::status_resolver::ResolveError;
use thiserror::Error;

/// Der zentrale Fehlertyp für alle Operationen in der `medtrack_core`-Bibliothek.
///
/// Fasst Fehler aus allen Modulen (Crypto, Codec, Resolver, Abläufe, Konfiguration)
/// an einem Ort zusammen.
#[derive(Error, Debug)]
pub enum MedTrackError {
    /// Verschlüsselung der Lieferdaten fehlgeschlagen.
    #[error("Encryption Error: {0}")]
    Encryption(#[from] EncryptionError),

    /// Entschlüsselung fehlgeschlagen. Endgültig; nicht automatisch wiederholen.
    #[error("Decryption Error: {0}")]
    Decryption(#[from] DecryptionError),

    #[error("Malformed Envelope: {0}")]
    MalformedEnvelope(#[from] MalformedEnvelopeError),

    #[error("Identifier Error: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("Resolve Error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Ledger Error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Input Validation Error: {0}")]
    Validation(#[from] InputValidationError),

    #[error("Flow Error: {0}")]
    Flow(#[from] FlowError),

    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authorization Error: {0}")]
    Authorization(#[from] AuthorizationError),

    /// Ein Fehler bei der Verarbeitung von JSON (Serialisierung oder Deserialisierung).
    #[error("JSON Processing Error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MedTrackError {
    /// Darf der Aufrufer die Operation später mit Backoff wiederholen?
    ///
    /// Kryptographie- und Formatfehler sind nie vorübergehend.
    pub fn is_transient(&self) -> bool {
        match self {
            MedTrackError::Ledger(e) => e.is_transient(),
            MedTrackError::Resolve(e) => e.is_retryable(),
            _ => false,
        }
    }
}
