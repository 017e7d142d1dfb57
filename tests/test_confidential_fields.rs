//! # tests/test_confidential_fields.rs
//!
//! Versiegeln und Öffnen der Lieferdaten über die öffentliche API, wie Producer und
//! Carrier sie verwenden.

use medtrack_lib::{
    open_delivery_envelope, open_delivery_info, seal_delivery_info, DeliveryInfo,
    EncodedKeyPair, MedTrackError,
};
use medtrack_lib::services::record_codec::MalformedEnvelopeError;

#[test]
fn test_carrier_reads_exact_plaintext() {
    let carrier = EncodedKeyPair::generate();
    let info = DeliveryInfo::new("123 Main St", "0987654321");

    let envelope = seal_delivery_info(&carrier.public_key, &info).unwrap();
    assert!(!envelope.contains("123 Main St"));
    assert!(!envelope.contains("0987654321"));

    let plaintext = open_delivery_envelope(&envelope, &carrier.secret_key).unwrap();
    assert_eq!(plaintext, r#"{"address":"123 Main St","phone":"0987654321"}"#);

    let parsed = open_delivery_info(&envelope, &carrier.secret_key).unwrap();
    assert_eq!(parsed, info);
    println!("SUCCESS: Carrier opened the sealed delivery info.");
}

#[test]
fn test_other_key_cannot_open() {
    let carrier = EncodedKeyPair::generate();
    let eavesdropper = EncodedKeyPair::generate();
    let envelope =
        seal_delivery_info(&carrier.public_key, &DeliveryInfo::new("123 Main St", "0987654321"))
            .unwrap();

    let err = open_delivery_envelope(&envelope, &eavesdropper.secret_key).unwrap_err();
    assert!(matches!(err, MedTrackError::Decryption(_)));
    assert!(!err.is_transient());
}

#[test]
fn test_garbage_is_reported_as_malformed() {
    let carrier = EncodedKeyPair::generate();
    for garbage in ["", "not an envelope", r#"{"ciphertext":"AAAA"}"#] {
        let err = open_delivery_envelope(garbage, &carrier.secret_key).unwrap_err();
        assert!(
            matches!(err, MedTrackError::MalformedEnvelope(_)),
            "unexpected error for {:?}: {}",
            garbage,
            err
        );
    }
}

#[test]
fn test_invalid_public_key_is_rejected_before_sealing() {
    let err = seal_delivery_info("too-short", &DeliveryInfo::new("123 Main St", "0987654321"))
        .unwrap_err();
    assert!(matches!(err, MedTrackError::Encryption(_)));
}

#[test]
fn test_delivery_info_debug_is_redacted() {
    let info = DeliveryInfo::new("123 Main St", "0987654321");
    let debug = format!("{:?}", info);
    assert!(!debug.contains("Main"));
    assert!(!debug.contains("0987654321"));
}

/// Ein mit `nacl.box` (X25519/XSalsa20-Poly1305) versiegelter Umschlag älterer Producer
/// für den Schlüssel `NACL_CARRIER_SECRET`. Klartext:
/// `{"address":"123 Main St","phone":"0987654321"}`.
const NACL_BOX_ENVELOPE: &str = r#"{"encrypted":"6GS210Gq4i+cZrSVJQisuL2YUzGKy36hQJsYAdI8TjM/nc7Eh2Gi30KHy6WiD9YSEuD/xdwAwuSqg6ICuwQ=","nonce":"yMnKy8zNzs/Q0dLT1NXW19jZ2tvc3d7f","ephemeralPublicKey":"VxR2nRFr92Q2rnS8eT0sMK0ZA8WaxSc4BcfiaYtBDDY="}"#;
const NACL_CARRIER_SECRET: &str = "AQIDBAUGBwgJCgsMDQ4PEBESExQVFhcYGRobHB0eHyA=";

#[test]
fn test_nacl_box_envelope_is_reported_as_unsupported() {
    let err = open_delivery_envelope(NACL_BOX_ENVELOPE, NACL_CARRIER_SECRET).unwrap_err();
    assert!(
        matches!(
            err,
            MedTrackError::MalformedEnvelope(MalformedEnvelopeError::UnsupportedFormat)
        ),
        "unexpected error: {}",
        err
    );
    assert!(!err.is_transient());
    assert!(open_delivery_info(NACL_BOX_ENVELOPE, NACL_CARRIER_SECRET).is_err());
}
