//! # src/ledger/mod.rs
//!
//! Definiert die Abstraktion für den Zugriff auf den verteilten Ledger. Die Kernlogik
//! (Resolver, Rollen-Abläufe) kennt nur diese Schnittstelle; Konsens, Finalität und
//! Vertragslogik liegen außerhalb.

use crate::models::identifier::ObjectId;
use crate::models::ledger_object::{LedgerObject, ObjectRead};
use crate::models::transaction::{SignedTransaction, TransactionDigest, TransactionEffects};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

pub use memory::InMemoryLedger;

/// Ein generischer Fehler-Typ für alle Ledger-Operationen.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger is unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger request timed out.")]
    Timeout,

    #[error("Ledger rejected the request: {0}")]
    Rejected(String),

    #[error("Ledger returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    /// Vorübergehende Fehler dürfen vom Aufrufer mit Backoff wiederholt werden.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_) | LedgerError::Timeout)
    }
}

/// Die Schnittstelle zum Ledger.
///
/// Implementierungen können ein RPC-Client, ein lokaler Knoten oder `InMemoryLedger`
/// für Tests sein.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Liest ein einzelnes Objekt. `Ok(None)` bedeutet: existiert nicht (oder noch nicht).
    async fn read_object(&self, id: &ObjectId) -> Result<Option<LedgerObject>, LedgerError>;

    /// Liest mehrere Objekte in einem Aufruf.
    ///
    /// Das Ergebnis ist positionsgleich zu `ids`; ein Fehler an einer Position darf die
    /// übrigen Positionen nicht beeinflussen.
    async fn read_objects_batch(&self, ids: &[ObjectId]) -> Result<Vec<ObjectRead>, LedgerError>;

    /// Übermittelt eine signierte Transaktion und liefert sofort ihren Digest.
    async fn submit_transaction(
        &self,
        transaction: SignedTransaction,
    ) -> Result<TransactionDigest, LedgerError>;

    /// Liest die Effekte einer Transaktion. `Ok(None)`, solange sie noch nicht sichtbar sind.
    async fn transaction_effects(
        &self,
        digest: &TransactionDigest,
    ) -> Result<Option<TransactionEffects>, LedgerError>;
}
