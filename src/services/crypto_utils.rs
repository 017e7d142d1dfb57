//! # src/services/crypto_utils.rs
//!
//! Kryptographische Grundbausteine: die asymmetrische Box-Verschlüsselung der
//! Lieferdaten (X25519 + HKDF + XChaCha20-Poly1305), die Erzeugung der
//! Carrier-Schlüsselpaare sowie Ed25519-Signaturen für Transaktionen.

// Zufallszahlengenerierung
use rand_core::{OsRng, RngCore};

// Kryptografische Hashes
use sha2::{Digest, Sha256, Sha512};

// Symmetrische Verschlüsselung
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit},
    XChaCha20Poly1305, XNonce,
};

// Ed25519 Signaturen
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

// X25519 Schlüsselvereinbarung
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hkdf::Hkdf;
use zeroize::Zeroize;

use crate::models::envelope::{EncodedKeyPair, EncryptedEnvelope, KeyPair, KEY_LEN, NONCE_LEN};
use crate::models::identifier::Address;

/// Kontext-String der Schlüsselableitung. Eine neue Version erfordert einen neuen String.
const BOX_KDF_INFO: &[u8] = b"medtrack/confidential-field/v1";

/// Domain-Byte für die Ableitung von Kontoadressen aus Ed25519-Schlüsseln.
const ED25519_ADDRESS_FLAG: u8 = 0x00;

/// Errors raised while sealing a payload for a recipient.
#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("Recipient public key must be {expected} bytes, got {actual}.")]
    InvalidPublicKeyLength { expected: usize, actual: usize },

    #[error("Recipient public key is not valid base64: {0}")]
    InvalidPublicKeyEncoding(String),

    #[error("Recipient public key is a low-order point and cannot be used.")]
    NonContributoryKey,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("AEAD encryption failed.")]
    SealFailed,
}

/// Errors raised while opening an envelope. None of these are retryable.
#[derive(Debug, thiserror::Error)]
pub enum DecryptionError {
    #[error("Secret key must be {expected} bytes, got {actual}.")]
    InvalidSecretKeyLength { expected: usize, actual: usize },

    #[error("Secret key is not valid base64: {0}")]
    InvalidSecretKeyEncoding(String),

    #[error("Envelope carries a low-order ephemeral key.")]
    NonContributoryKey,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Decryption failed: wrong key, tampered data, or corrupted envelope.")]
    AuthenticationFailed,

    #[error("Decrypted payload is not valid UTF-8.")]
    InvalidUtf8,
}

/// Generates a fresh X25519 key pair for the box construction.
///
/// The secret half must stay with its generator (the carrier); only the public
/// half is handed to producers.
pub fn generate_key_pair() -> KeyPair {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = X25519PublicKey::from(&secret);
    KeyPair::new(public.to_bytes(), secret.to_bytes())
}

/// Generates a key pair and returns both halves base64-encoded.
pub fn generate_encoded_key_pair() -> EncodedKeyPair {
    let pair = generate_key_pair();
    EncodedKeyPair {
        public_key: BASE64.encode(pair.public_key()),
        secret_key: BASE64.encode(pair.secret_key()),
    }
}

/// Decodes a base64 public key and checks its length.
pub fn decode_public_key(encoded: &str) -> Result<[u8; KEY_LEN], EncryptionError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| EncryptionError::InvalidPublicKeyEncoding(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| EncryptionError::InvalidPublicKeyLength {
        expected: KEY_LEN,
        actual,
    })
}

/// Decodes a base64 secret key and checks its length.
pub fn decode_secret_key(encoded: &str) -> Result<[u8; KEY_LEN], DecryptionError> {
    let mut bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| DecryptionError::InvalidSecretKeyEncoding(e.to_string()))?;
    let actual = bytes.len();
    let result = <[u8; KEY_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        DecryptionError::InvalidSecretKeyLength {
            expected: KEY_LEN,
            actual,
        }
    });
    bytes.zeroize();
    result
}

/// Leitet den symmetrischen Box-Schlüssel aus dem Shared Secret ab.
///
/// Beide öffentlichen Schlüssel fließen als Salt ein, sodass der Schlüssel an genau
/// dieses Paar aus Ephemeral- und Empfängerschlüssel gebunden ist.
fn derive_box_key(
    shared_secret: &[u8; 32],
    ephemeral_public: &[u8; KEY_LEN],
    recipient_public: &[u8; KEY_LEN],
) -> Result<[u8; 32], String> {
    let mut salt = [0u8; KEY_LEN * 2];
    salt[..KEY_LEN].copy_from_slice(ephemeral_public);
    salt[KEY_LEN..].copy_from_slice(recipient_public);

    let hkdf = Hkdf::<Sha256>::new(Some(&salt), shared_secret);
    let mut key = [0u8; 32];
    hkdf.expand(BOX_KDF_INFO, &mut key).map_err(|e| e.to_string())?;
    Ok(key)
}

/// Encrypts `plaintext` so that only the holder of the matching secret key can read it.
///
/// A fresh ephemeral X25519 key and a fresh 24-byte nonce are generated for every call,
/// so encrypting the same plaintext twice yields unrelated envelopes.
///
/// # Errors
/// Returns an `EncryptionError` if `recipient_public_key` is not a 32-byte key or is a
/// low-order point.
pub fn encrypt(
    recipient_public_key: &[u8],
    plaintext: &[u8],
) -> Result<EncryptedEnvelope, EncryptionError> {
    let recipient_bytes: [u8; KEY_LEN] =
        recipient_public_key
            .try_into()
            .map_err(|_| EncryptionError::InvalidPublicKeyLength {
                expected: KEY_LEN,
                actual: recipient_public_key.len(),
            })?;
    let recipient_public = X25519PublicKey::from(recipient_bytes);

    let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral_secret);

    let shared_secret = ephemeral_secret.diffie_hellman(&recipient_public);
    if !shared_secret.was_contributory() {
        return Err(EncryptionError::NonContributoryKey);
    }

    let mut key = derive_box_key(
        shared_secret.as_bytes(),
        ephemeral_public.as_bytes(),
        &recipient_bytes,
    )
    .map_err(EncryptionError::KeyDerivation)?;

    let cipher = XChaCha20Poly1305::new((&key).into());
    key.zeroize();
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| EncryptionError::SealFailed)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(nonce.as_slice());

    Ok(EncryptedEnvelope {
        ciphertext,
        nonce: nonce_bytes,
        ephemeral_public_key: ephemeral_public.to_bytes(),
    })
}

/// Opens an envelope with the recipient's secret key.
///
/// Authentication failure is terminal: the key is wrong or the envelope was altered.
/// Callers must surface the error and never iterate over candidate keys.
pub fn decrypt(
    envelope: &EncryptedEnvelope,
    recipient_secret_key: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    let mut secret_bytes: [u8; KEY_LEN] =
        recipient_secret_key
            .try_into()
            .map_err(|_| DecryptionError::InvalidSecretKeyLength {
                expected: KEY_LEN,
                actual: recipient_secret_key.len(),
            })?;
    let secret = StaticSecret::from(secret_bytes);
    secret_bytes.zeroize();
    let recipient_public = X25519PublicKey::from(&secret);

    let ephemeral_public = X25519PublicKey::from(envelope.ephemeral_public_key);
    let shared_secret = secret.diffie_hellman(&ephemeral_public);
    if !shared_secret.was_contributory() {
        return Err(DecryptionError::NonContributoryKey);
    }

    let mut key = derive_box_key(
        shared_secret.as_bytes(),
        &envelope.ephemeral_public_key,
        recipient_public.as_bytes(),
    )
    .map_err(DecryptionError::KeyDerivation)?;

    let cipher = XChaCha20Poly1305::new((&key).into());
    key.zeroize();
    let nonce = XNonce::from_slice(&envelope.nonce);

    // `decrypt` prüft das Poly1305-Tag vor der Rückgabe.
    cipher
        .decrypt(nonce, envelope.ciphertext.as_slice())
        .map_err(|_| DecryptionError::AuthenticationFailed)
}

/// Erzeugt ein zufälliges Ed25519-Schlüsselpaar für die Transaktionssignatur.
pub fn generate_ed25519_keypair() -> (VerifyingKey, SigningKey) {
    let mut key_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut key_bytes);
    let signing_key = SigningKey::from_bytes(&key_bytes);
    key_bytes.zeroize();
    (signing_key.verifying_key(), signing_key)
}

/// Erzeugt ein deterministisches Ed25519-Schlüsselpaar aus einem Seed-String.
///
/// # Warnung
/// **Nur für Tests.** Der Seed wird lediglich gehasht und ist nicht gegen
/// Brute-Force-Angriffe gehärtet.
pub fn generate_ed25519_keypair_for_tests(seed: &str) -> (VerifyingKey, SigningKey) {
    let hash = Sha512::digest(seed.as_bytes());
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&hash[..32]);
    let signing_key = SigningKey::from_bytes(&key_bytes);
    (signing_key.verifying_key(), signing_key)
}

/// Leitet die Kontoadresse aus einem öffentlichen Ed25519-Schlüssel ab:
/// `SHA3-256(flag || public_key)`.
pub fn derive_address(public_key: &VerifyingKey) -> Address {
    use sha3::Digest as _;
    let mut hasher = sha3::Sha3_256::new();
    hasher.update([ED25519_ADDRESS_FLAG]);
    hasher.update(public_key.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    Address::from_bytes(&digest)
}

/// Computes a SHA3-256 hash of the input and returns it base58-encoded.
pub fn get_hash(input: impl AsRef<[u8]>) -> String {
    use sha3::Digest as _;
    let mut hasher = sha3::Sha3_256::new();
    hasher.update(input.as_ref());
    bs58::encode(hasher.finalize()).into_string()
}

/// Computes a raw SHA3-256 hash.
pub fn hash_bytes(input: impl AsRef<[u8]>) -> [u8; 32] {
    use sha3::Digest as _;
    sha3::Sha3_256::digest(input.as_ref()).into()
}

/// Signs a message with an Ed25519 signing key.
pub fn sign_ed25519(signing_key: &SigningKey, message: &[u8]) -> Signature {
    signing_key.sign(message)
}

/// Verifies an Ed25519 signature. Returns `true` if it is valid.
pub fn verify_ed25519(public_key: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
    public_key.verify(message, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_order_recipient_key_is_rejected() {
        // Der Nullpunkt ist ein Punkt niedriger Ordnung.
        let result = encrypt(&[0u8; 32], b"secret");
        assert!(matches!(result, Err(EncryptionError::NonContributoryKey)));
    }

    #[test]
    fn tampered_nonce_fails_authentication() {
        let pair = generate_key_pair();
        let mut envelope = encrypt(pair.public_key(), b"payload").unwrap();
        envelope.nonce[0] ^= 0x01;
        assert!(matches!(
            decrypt(&envelope, pair.secret_key()),
            Err(DecryptionError::AuthenticationFailed)
        ));
    }

    #[test]
    fn address_is_stable_for_a_key() {
        let (public_key, _) = generate_ed25519_keypair_for_tests("producer");
        assert_eq!(derive_address(&public_key), derive_address(&public_key));
        let (other, _) = generate_ed25519_keypair_for_tests("carrier");
        assert_ne!(derive_address(&public_key), derive_address(&other));
    }
}
