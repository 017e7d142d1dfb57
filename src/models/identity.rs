//! # src/models/identity.rs
//!
//! Die aktive Identität, mit der ein Akteur (Producer, Carrier, Pharmacy) Transaktionen
//! signiert. Sie wird jeder Operation explizit übergeben, statt aus einem globalen
//! Wallet-Kontext gelesen zu werden.

use crate::models::identifier::Address;
use crate::services::crypto_utils;
use ed25519_dalek::{SigningKey, VerifyingKey};
use std::fmt;

/// Repräsentiert die kryptographische Identität eines Akteurs.
/// `SigningKey` nullt sich beim Drop selbst.
#[derive(Clone)]
pub struct ActiveIdentity {
    /// Der private Ed25519-Schlüssel. Verlässt niemals den Prozess.
    pub signing_key: SigningKey,
    pub public_key: VerifyingKey,
    /// Die aus dem öffentlichen Schlüssel abgeleitete Kontoadresse.
    pub address: Address,
}

impl ActiveIdentity {
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = signing_key.verifying_key();
        let address = crypto_utils::derive_address(&public_key);
        Self {
            signing_key,
            public_key,
            address,
        }
    }

    /// Erzeugt eine neue, zufällige Identität.
    pub fn generate() -> Self {
        let (_, signing_key) = crypto_utils::generate_ed25519_keypair();
        Self::from_signing_key(signing_key)
    }
}

impl fmt::Debug for ActiveIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveIdentity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
