//! # src/services/record_codec.rs
//!
//! Serialisiert einen `EncryptedEnvelope` in einen einzelnen Text, der als opakes Feld
//! auf dem Ledger gespeichert wird, und liest ihn wieder ein.
//!
//! Format (kanonisches JSON, Schlüssel sortiert):
//! `{"ciphertext":"<b64>","ephemeralPublicKey":"<b64>","nonce":"<b64>"}`

use crate::models::envelope::{EncryptedEnvelope, KEY_LEN, NONCE_LEN};
use crate::services::utils::to_canonical_json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

/// Fehler beim Einlesen eines Umschlags. Es gibt keine teilweise Wiederherstellung.
#[derive(Debug, thiserror::Error)]
pub enum MalformedEnvelopeError {
    #[error("Envelope is not valid JSON or lacks a required field: {0}")]
    InvalidJson(String),

    #[error("Envelope field '{field}' is not valid base64: {reason}")]
    InvalidBase64 { field: &'static str, reason: String },

    #[error("Envelope field '{field}' must be {expected} bytes, got {actual}.")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Envelope could not be encoded: {0}")]
    Encoding(String),

    #[error("Envelope is in the unsupported NaCl box format (field 'encrypted').")]
    UnsupportedFormat,
}

/// Die Transportform des Umschlags.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeWire {
    ciphertext: String,
    nonce: String,
    ephemeral_public_key: String,
}

/// Eingelesene Form. `encrypted` kennzeichnet NaCl-Box-Umschläge (XSalsa20-Poly1305)
/// älterer Producer, die mit diesem Schlüsselaustausch nicht zu öffnen sind.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingEnvelope {
    ciphertext: Option<String>,
    encrypted: Option<String>,
    nonce: String,
    ephemeral_public_key: String,
}

/// Kodiert einen Umschlag deterministisch als Text.
pub fn serialize(envelope: &EncryptedEnvelope) -> Result<String, MalformedEnvelopeError> {
    let wire = EnvelopeWire {
        ciphertext: BASE64.encode(&envelope.ciphertext),
        nonce: BASE64.encode(envelope.nonce),
        ephemeral_public_key: BASE64.encode(envelope.ephemeral_public_key),
    };
    to_canonical_json(&wire).map_err(|e| MalformedEnvelopeError::Encoding(e.to_string()))
}

/// Liest einen Umschlag aus seinem Transporttext.
pub fn deserialize(text: &str) -> Result<EncryptedEnvelope, MalformedEnvelopeError> {
    let wire: IncomingEnvelope = serde_json::from_str(text.trim())
        .map_err(|e| MalformedEnvelopeError::InvalidJson(e.to_string()))?;

    let ciphertext = match (&wire.ciphertext, &wire.encrypted) {
        (Some(ciphertext), _) => decode_field("ciphertext", ciphertext)?,
        (None, Some(_)) => return Err(MalformedEnvelopeError::UnsupportedFormat),
        (None, None) => {
            return Err(MalformedEnvelopeError::InvalidJson(
                "missing field `ciphertext`".to_string(),
            ))
        }
    };
    let nonce = decode_fixed::<NONCE_LEN>("nonce", &wire.nonce)?;
    let ephemeral_public_key =
        decode_fixed::<KEY_LEN>("ephemeralPublicKey", &wire.ephemeral_public_key)?;

    Ok(EncryptedEnvelope {
        ciphertext,
        nonce,
        ephemeral_public_key,
    })
}

fn decode_field(field: &'static str, value: &str) -> Result<Vec<u8>, MalformedEnvelopeError> {
    BASE64
        .decode(value)
        .map_err(|e| MalformedEnvelopeError::InvalidBase64 {
            field,
            reason: e.to_string(),
        })
}

fn decode_fixed<const N: usize>(
    field: &'static str,
    value: &str,
) -> Result<[u8; N], MalformedEnvelopeError> {
    let bytes = decode_field(field, value)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| MalformedEnvelopeError::InvalidLength {
            field,
            expected: N,
            actual,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncryptedEnvelope {
        EncryptedEnvelope {
            ciphertext: vec![1, 2, 3, 4, 5],
            nonce: [7u8; NONCE_LEN],
            ephemeral_public_key: [9u8; KEY_LEN],
        }
    }

    #[test]
    fn output_has_sorted_keys() {
        let text = serialize(&sample()).unwrap();
        let c = text.find("\"ciphertext\"").unwrap();
        let e = text.find("\"ephemeralPublicKey\"").unwrap();
        let n = text.find("\"nonce\"").unwrap();
        assert!(c < e && e < n);
        assert!(!text.contains(' '));
    }

    #[test]
    fn nacl_box_field_name_is_unsupported() {
        let text = serialize(&sample()).unwrap().replace("\"ciphertext\"", "\"encrypted\"");
        assert!(matches!(
            deserialize(&text),
            Err(MalformedEnvelopeError::UnsupportedFormat)
        ));
    }
}
