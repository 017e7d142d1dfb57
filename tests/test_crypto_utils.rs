// cargo test --test test_crypto_utils

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use medtrack_lib::crypto_utils::{
        decode_public_key, decode_secret_key, decrypt, derive_address, encrypt,
        generate_ed25519_keypair_for_tests, generate_key_pair, get_hash, sign_ed25519,
        verify_ed25519, DecryptionError, EncryptionError,
    };
    use medtrack_lib::models::envelope::{KEY_LEN, NONCE_LEN};
    use medtrack_lib::EncodedKeyPair;

    #[test]
    fn test_round_trip_for_various_plaintexts() {
        let pair = generate_key_pair();
        let long = "x".repeat(4096);
        let plaintexts: [&[u8]; 4] = [
            b"",
            b"{\"address\":\"123 Main St\",\"phone\":\"0987654321\"}",
            "Đường Nguyễn Trãi, Quận 1".as_bytes(),
            long.as_bytes(),
        ];
        for plaintext in plaintexts {
            let envelope = encrypt(pair.public_key(), plaintext).unwrap();
            assert_eq!(envelope.nonce.len(), NONCE_LEN);
            let opened = decrypt(&envelope, pair.secret_key()).unwrap();
            assert_eq!(opened, plaintext);
        }
        println!("SUCCESS: All plaintexts survive encrypt/decrypt.");
    }

    #[test]
    fn test_encrypting_twice_gives_different_envelopes() {
        let pair = generate_key_pair();
        let first = encrypt(pair.public_key(), b"same plaintext").unwrap();
        let second = encrypt(pair.public_key(), b"same plaintext").unwrap();
        assert_ne!(first.ciphertext, second.ciphertext);
        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ephemeral_public_key, second.ephemeral_public_key);
    }

    #[test]
    fn test_wrong_key_fails_with_decryption_error() {
        let intended = generate_key_pair();
        let other = generate_key_pair();
        let envelope = encrypt(intended.public_key(), b"for the carrier only").unwrap();
        let result = decrypt(&envelope, other.secret_key());
        assert!(matches!(result, Err(DecryptionError::AuthenticationFailed)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Decryption failed: wrong key, tampered data, or corrupted envelope."
        );
    }

    #[test]
    fn test_tampered_ciphertext_is_detected() {
        let pair = generate_key_pair();
        let mut envelope = encrypt(pair.public_key(), b"payload").unwrap();
        let last = envelope.ciphertext.len() - 1;
        envelope.ciphertext[last] ^= 0xff;
        assert!(matches!(
            decrypt(&envelope, pair.secret_key()),
            Err(DecryptionError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_encoded_key_pair_decodes_to_matching_keys() {
        let pair = EncodedKeyPair::generate();
        let public_key = decode_public_key(&pair.public_key).unwrap();
        let secret_key = decode_secret_key(&pair.secret_key).unwrap();
        assert_eq!(public_key.len(), KEY_LEN);

        let envelope = encrypt(&public_key, b"hello").unwrap();
        assert_eq!(decrypt(&envelope, &secret_key).unwrap(), b"hello");

        let debug = format!("{:?}", pair);
        assert!(!debug.contains(&pair.secret_key));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_invalid_public_keys_are_rejected() {
        let short = BASE64.encode([1u8; 16]);
        assert!(matches!(
            decode_public_key(&short),
            Err(EncryptionError::InvalidPublicKeyLength {
                expected: 32,
                actual: 16
            })
        ));
        assert!(matches!(
            decode_public_key("not base64 !!"),
            Err(EncryptionError::InvalidPublicKeyEncoding(_))
        ));
        assert!(matches!(
            decode_secret_key(&short),
            Err(DecryptionError::InvalidSecretKeyLength { .. })
        ));
    }

    #[test]
    fn test_signatures_and_addresses() {
        let (public_key, signing_key) = generate_ed25519_keypair_for_tests("producer");
        let (again, _) = generate_ed25519_keypair_for_tests("producer");
        assert_eq!(public_key, again);
        assert_eq!(derive_address(&public_key), derive_address(&again));

        let signature = sign_ed25519(&signing_key, b"message");
        assert!(verify_ed25519(&public_key, b"message", &signature));
        assert!(!verify_ed25519(&public_key, b"other message", &signature));

        assert_eq!(get_hash("abc"), get_hash("abc"));
        assert_ne!(get_hash("abc"), get_hash("abd"));
    }
}
