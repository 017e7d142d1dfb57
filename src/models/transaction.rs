//! # src/models/transaction.rs
//!
//! Definiert die Transaktionen, mit denen Producer, Carrier und Pharmacy einen
//! Statusübergang an den Ledger übermitteln, sowie deren Effekte.

use crate::models::identifier::{Address, ObjectId};
use crate::models::identity::ActiveIdentity;
use crate::services::crypto_utils;
use crate::services::utils::to_canonical_json;
use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fehler bei der Prüfung einer signierten Transaktion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureCheckError {
    #[error("Public key is not a valid Ed25519 key: {0}")]
    InvalidPublicKey(String),

    #[error("Signature is not a valid Ed25519 signature: {0}")]
    InvalidSignatureEncoding(String),

    #[error("Sender address does not belong to the signing key.")]
    SenderMismatch,

    #[error("Signature does not match the transaction data.")]
    InvalidSignature,

    #[error("Transaction data could not be canonicalized: {0}")]
    Encoding(String),
}

/// Die drei Vertragsaufrufe des Lieferketten-Moduls.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum TransactionCall {
    /// Producer: legt eine neue Charge samt verschlüsselter Lieferdaten an.
    CreateRecord {
        medicine_code: String,
        producer_name: String,
        receiver_company: String,
        /// Der serialisierte `EncryptedEnvelope` (siehe `record_codec`).
        encrypted_info: String,
    },
    /// Carrier: übernimmt die Charge.
    UpdateRecordShipping {
        batch_id: ObjectId,
        carrier_name: String,
        carrier_phone: String,
        location: String,
        clock: ObjectId,
    },
    /// Pharmacy: bestätigt den Empfang.
    CompleteRecordDelivery {
        batch_id: ObjectId,
        pharmacy_name: String,
        pharmacy_phone: String,
        location: String,
        clock: ObjectId,
    },
}

impl TransactionCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            TransactionCall::CreateRecord { .. } => "create_record",
            TransactionCall::UpdateRecordShipping { .. } => "update_record_shipping",
            TransactionCall::CompleteRecordDelivery { .. } => "complete_record_delivery",
        }
    }

    /// Das Aufrufziel im Format `0x<package>::<module>::<function>`.
    pub fn target(&self, package_id: &ObjectId, module_name: &str) -> String {
        format!("{}::{}::{}", package_id, module_name, self.function_name())
    }
}

/// Der zu signierende Teil einer Transaktion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionData {
    pub sender: Address,
    /// Aufrufziel, z.B. `0x…::supply_chain::create_record`.
    pub target: String,
    pub call: TransactionCall,
    pub gas_budget: u64,
    /// Millisekunden seit Epoch zum Zeitpunkt der Erstellung.
    pub created_at_ms: i64,
}

/// Eine signierte Transaktion, bereit zur Übermittlung.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub data: TransactionData,
    /// Hex-kodierter öffentlicher Ed25519-Schlüssel des Senders.
    pub public_key: String,
    /// Hex-kodierte Ed25519-Signatur über das kanonische JSON von `data`.
    pub signature: String,
}

impl TransactionData {
    /// Die Bytes, über die signiert wird: das kanonische JSON der Daten.
    pub fn signing_payload(&self) -> Result<String, serde_json::Error> {
        to_canonical_json(self)
    }
}

impl SignedTransaction {
    /// Signiert `data` mit der aktiven Identität.
    pub fn sign(data: TransactionData, identity: &ActiveIdentity) -> Result<Self, serde_json::Error> {
        let payload = data.signing_payload()?;
        let signature = crypto_utils::sign_ed25519(&identity.signing_key, payload.as_bytes());
        Ok(Self {
            data,
            public_key: hex::encode(identity.public_key.as_bytes()),
            signature: hex::encode(signature.to_bytes()),
        })
    }

    /// Prüft Signatur und Zuordnung von Absenderadresse zu Schlüssel.
    pub fn verify(&self) -> Result<(), SignatureCheckError> {
        let key_bytes: [u8; 32] = hex::decode(&self.public_key)
            .map_err(|e| SignatureCheckError::InvalidPublicKey(e.to_string()))?
            .try_into()
            .map_err(|_| SignatureCheckError::InvalidPublicKey("expected 32 bytes".to_string()))?;
        let public_key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| SignatureCheckError::InvalidPublicKey(e.to_string()))?;

        if crypto_utils::derive_address(&public_key) != self.data.sender {
            return Err(SignatureCheckError::SenderMismatch);
        }

        let signature_bytes: [u8; 64] = hex::decode(&self.signature)
            .map_err(|e| SignatureCheckError::InvalidSignatureEncoding(e.to_string()))?
            .try_into()
            .map_err(|_| {
                SignatureCheckError::InvalidSignatureEncoding("expected 64 bytes".to_string())
            })?;
        let signature = Signature::from_bytes(&signature_bytes);

        let payload = self
            .data
            .signing_payload()
            .map_err(|e| SignatureCheckError::Encoding(e.to_string()))?;
        if crypto_utils::verify_ed25519(&public_key, payload.as_bytes(), &signature) {
            Ok(())
        } else {
            Err(SignatureCheckError::InvalidSignature)
        }
    }

    /// Der Digest: Base58 des SHA3-256-Hashes über das kanonische JSON der signierten Transaktion.
    pub fn digest(&self) -> Result<TransactionDigest, serde_json::Error> {
        Ok(TransactionDigest(crypto_utils::get_hash(to_canonical_json(self)?)))
    }
}

/// Der Digest einer Transaktion (Base58 eines SHA3-256-Hashes).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TransactionDigest(pub String);

impl fmt::Display for TransactionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ausgang einer Transaktion.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Success,
    Failure,
}

/// Entspricht `effects.status` der Ledger-Antwort.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExecutionStatus {
    pub status: ExecutionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ein durch die Transaktion neu erzeugtes Objekt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatedObject {
    pub object_id: ObjectId,
    pub object_type: String,
}

/// Die Effekte einer ausgeführten Transaktion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionEffects {
    pub digest: TransactionDigest,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub created: Vec<CreatedObject>,
}

impl TransactionEffects {
    pub fn is_success(&self) -> bool {
        self.status.status == ExecutionOutcome::Success
    }

    /// Die ID des ersten erzeugten Objekts, dessen Typ auf `::<type_name>` endet.
    pub fn created_of_type(&self, type_name: &str) -> Option<&ObjectId> {
        self.created
            .iter()
            .find(|c| crate::models::ledger_object::type_matches(&c.object_type, type_name))
            .map(|c| &c.object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_status_uses_ledger_field_names() {
        let json = r#"{"digest":"abc","status":{"status":"failure","error":"MoveAbort(1)"}}"#;
        let effects: TransactionEffects = serde_json::from_str(json).unwrap();
        assert!(!effects.is_success());
        assert_eq!(effects.status.error.as_deref(), Some("MoveAbort(1)"));
        assert!(effects.created.is_empty());
    }

    fn sample_data(identity: &ActiveIdentity) -> TransactionData {
        TransactionData {
            sender: identity.address.clone(),
            target: "0x2::supply_chain::create_record".into(),
            call: TransactionCall::CreateRecord {
                medicine_code: "PhT-2025-12".into(),
                producer_name: "DHG Pharma".into(),
                receiver_company: "Long Chau".into(),
                encrypted_info: "{}".into(),
            },
            gas_budget: 200_000_000,
            created_at_ms: 1_764_577_800_000,
        }
    }

    #[test]
    fn signed_transaction_verifies_and_detects_tampering() {
        let identity = ActiveIdentity::generate();
        let signed = SignedTransaction::sign(sample_data(&identity), &identity).unwrap();
        assert_eq!(signed.verify(), Ok(()));

        let mut tampered = signed.clone();
        tampered.data.gas_budget = 1;
        assert_eq!(tampered.verify(), Err(SignatureCheckError::InvalidSignature));

        let other = ActiveIdentity::generate();
        let mut wrong_sender = signed.clone();
        wrong_sender.data.sender = other.address.clone();
        assert_eq!(wrong_sender.verify(), Err(SignatureCheckError::SenderMismatch));

        assert_eq!(signed.digest().unwrap(), signed.clone().digest().unwrap());
        assert_ne!(signed.digest().unwrap(), tampered.digest().unwrap());
    }

    #[test]
    fn target_renders_package_module_function() {
        let pkg = ObjectId::from_short_hex("0x2").unwrap();
        let call = TransactionCall::CreateRecord {
            medicine_code: "PhT-2025-12".into(),
            producer_name: "DHG Pharma".into(),
            receiver_company: "Long Chau".into(),
            encrypted_info: "{}".into(),
        };
        assert_eq!(
            call.target(&pkg, "supply_chain"),
            format!("{}::supply_chain::create_record", pkg)
        );
    }
}
