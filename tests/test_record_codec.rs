//! # tests/test_record_codec.rs
//!
//! Integrationstests für das Transportformat des `EncryptedEnvelope`.

use medtrack_lib::crypto_utils::{encrypt, generate_key_pair};
use medtrack_lib::services::record_codec::{deserialize, serialize, MalformedEnvelopeError};
use serde_json::Value;

#[test]
fn test_serialization_is_idempotent_for_real_envelopes() {
    let pair = generate_key_pair();
    for plaintext in [&b""[..], b"short", b"{\"address\":\"123 Main St\"}"] {
        let envelope = encrypt(pair.public_key(), plaintext).unwrap();
        let text = serialize(&envelope).unwrap();
        let decoded = deserialize(&text).unwrap();
        assert_eq!(decoded, envelope);
        assert_eq!(serialize(&decoded).unwrap(), text);
    }
    println!("SUCCESS: Envelopes survive serialize/deserialize unchanged.");
}

#[test]
fn test_wire_format_field_names() {
    let pair = generate_key_pair();
    let envelope = encrypt(pair.public_key(), b"payload").unwrap();
    let text = serialize(&envelope).unwrap();

    let json: Value = serde_json::from_str(&text).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 3);
    for field in ["ciphertext", "ephemeralPublicKey", "nonce"] {
        assert!(object.get(field).and_then(Value::as_str).is_some(), "missing {}", field);
    }
    assert!(text.starts_with("{\"ciphertext\":"));
}

#[test]
fn test_missing_field_is_rejected() {
    let text = r#"{"ciphertext":"AAAA","nonce":"AAAA"}"#;
    assert!(matches!(
        deserialize(text),
        Err(MalformedEnvelopeError::InvalidJson(_))
    ));
    assert!(matches!(
        deserialize("not json at all"),
        Err(MalformedEnvelopeError::InvalidJson(_))
    ));
}

#[test]
fn test_invalid_base64_names_the_field() {
    let pair = generate_key_pair();
    let text = serialize(&encrypt(pair.public_key(), b"x").unwrap()).unwrap();
    let mut json: Value = serde_json::from_str(&text).unwrap();
    json["nonce"] = Value::String("%%%".to_string());

    match deserialize(&json.to_string()) {
        Err(MalformedEnvelopeError::InvalidBase64 { field, .. }) => assert_eq!(field, "nonce"),
        other => panic!("expected InvalidBase64, got {:?}", other),
    }
}

#[test]
fn test_wrong_nonce_length_is_rejected() {
    // 12 Bytes: eine gültige Base64-Nonce, aber für XChaCha20 zu kurz.
    let text = r#"{"ciphertext":"AAAA","ephemeralPublicKey":"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=","nonce":"AAAAAAAAAAAAAAAA"}"#;
    match deserialize(text) {
        Err(MalformedEnvelopeError::InvalidLength {
            field,
            expected,
            actual,
        }) => {
            assert_eq!(field, "nonce");
            assert_eq!(expected, 24);
            assert_eq!(actual, 12);
        }
        other => panic!("expected InvalidLength, got {:?}", other),
    }
}
