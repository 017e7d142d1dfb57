//! # src/models/envelope.rs
//!
//! Definiert die Datenstrukturen für die vertrauliche Übermittlung der Lieferadresse
//! und Telefonnummer an den Carrier: das Schlüsselpaar des Empfängers, den
//! verschlüsselten Umschlag (`EncryptedEnvelope`) und den Klartext (`DeliveryInfo`).

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Länge eines X25519-Schlüssels in Bytes.
pub const KEY_LEN: usize = 32;

/// Länge der XChaCha20-Poly1305-Nonce in Bytes.
pub const NONCE_LEN: usize = 24;

/// Ein Schlüsselpaar für die Box-Verschlüsselung (X25519).
///
/// Der geheime Schlüssel gehört ausschließlich dem Erzeuger (dem Carrier) und wird
/// beim Verlassen des Gültigkeitsbereichs genullt. Der öffentliche Schlüssel darf frei
/// geteilt werden.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    #[zeroize(skip)]
    public_key: [u8; KEY_LEN],
    secret_key: [u8; KEY_LEN],
}

impl KeyPair {
    pub fn new(public_key: [u8; KEY_LEN], secret_key: [u8; KEY_LEN]) -> Self {
        Self { public_key, secret_key }
    }

    pub fn public_key(&self) -> &[u8; KEY_LEN] {
        &self.public_key
    }

    pub fn secret_key(&self) -> &[u8; KEY_LEN] {
        &self.secret_key
    }
}

// Kein Debug mit Schlüsselbytes.
impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key))
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Ein Base64-kodiertes Schlüsselpaar, wie es dem Carrier angezeigt wird.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncodedKeyPair {
    #[zeroize(skip)]
    pub public_key: String,
    pub secret_key: String,
}

impl EncodedKeyPair {
    /// Erzeugt ein neues, zufälliges Schlüsselpaar für einen Carrier.
    pub fn generate() -> Self {
        crate::services::crypto_utils::generate_encoded_key_pair()
    }
}

impl fmt::Debug for EncodedKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedKeyPair")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Repräsentiert ein einzelnes Verschlüsselungsereignis.
///
/// Der `ephemeral_public_key` wird für jeden Umschlag neu erzeugt und niemals
/// wiederverwendet. Die festen Array-Längen garantieren die Größen von Nonce und Schlüssel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// Der authentifizierte Chiffretext (inkl. Poly1305-Tag).
    pub ciphertext: Vec<u8>,
    /// Die zufällige Nonce dieses Umschlags.
    pub nonce: [u8; NONCE_LEN],
    /// Der öffentliche Teil des einmaligen Sender-Schlüssels.
    pub ephemeral_public_key: [u8; KEY_LEN],
}

/// Die vertraulichen Lieferdaten, die nur der Carrier lesen darf.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DeliveryInfo {
    pub address: String,
    pub phone: String,
}

impl DeliveryInfo {
    pub fn new(address: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            phone: phone.into(),
        }
    }
}

impl fmt::Debug for DeliveryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeliveryInfo { <redacted> }")
    }
}
