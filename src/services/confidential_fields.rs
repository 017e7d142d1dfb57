//! # src/services/confidential_fields.rs
//!
//! Versiegelt die Lieferdaten (Adresse + Telefon) für genau einen Carrier und öffnet sie
//! wieder. Kombiniert `crypto_utils` (Box-Verschlüsselung) mit `record_codec`
//! (Transportformat) zu den beiden Operationen, die Producer und Carrier benötigen.

use crate::error::MedTrackError;
use crate::models::envelope::DeliveryInfo;
use crate::services::crypto_utils::{self, DecryptionError};
use crate::services::record_codec;
use tracing::debug;
use zeroize::Zeroize;

/// Verschlüsselt die Lieferdaten mit dem öffentlichen Schlüssel des Carriers.
///
/// # Arguments
/// * `carrier_public_key` - Der Base64-kodierte öffentliche X25519-Schlüssel des Carriers.
/// * `info` - Die zu schützenden Lieferdaten.
///
/// # Returns
/// Den serialisierten Umschlag, bereit zur Ablage im `encrypted_info`-Feld.
pub fn seal_delivery_info(
    carrier_public_key: &str,
    info: &DeliveryInfo,
) -> Result<String, MedTrackError> {
    let public_key = crypto_utils::decode_public_key(carrier_public_key)?;
    let mut plaintext = serde_json::to_vec(info)?;
    let envelope = crypto_utils::encrypt(&public_key, &plaintext);
    plaintext.zeroize();
    let text = record_codec::serialize(&envelope?)?;
    debug!(envelope_len = text.len(), "Sealed delivery info for carrier");
    Ok(text)
}

/// Öffnet einen Umschlag mit dem geheimen Schlüssel des Carriers.
///
/// # Returns
/// Den exakt vom Producer verschlüsselten JSON-String.
///
/// # Errors
/// `MalformedEnvelope`, wenn der Text kein gültiger Umschlag ist; `Decryption`, wenn der
/// Schlüssel nicht passt oder die Daten verändert wurden. Beide Fehler sind endgültig.
pub fn open_delivery_envelope(
    envelope_text: &str,
    carrier_secret_key: &str,
) -> Result<String, MedTrackError> {
    let envelope = record_codec::deserialize(envelope_text)?;
    let mut secret_key = crypto_utils::decode_secret_key(carrier_secret_key)?;
    let plaintext = crypto_utils::decrypt(&envelope, &secret_key);
    secret_key.zeroize();
    let text = String::from_utf8(plaintext?).map_err(|_| DecryptionError::InvalidUtf8)?;
    Ok(text)
}

/// Wie `open_delivery_envelope`, liefert aber die geparsten Lieferdaten.
pub fn open_delivery_info(
    envelope_text: &str,
    carrier_secret_key: &str,
) -> Result<DeliveryInfo, MedTrackError> {
    let mut json = open_delivery_envelope(envelope_text, carrier_secret_key)?;
    let info = serde_json::from_str(&json);
    json.zeroize();
    Ok(info?)
}
