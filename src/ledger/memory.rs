//! # src/ledger/memory.rs
//!
//! Eine In-Memory-Implementierung von `LedgerGateway`. Sie führt die drei Aufrufe des
//! Lieferketten-Moduls mit minimalen Statusprüfungen aus und dient als Referenz für
//! Tests und Demos. Über Hilfsmethoden lassen sich beliebige (auch defekte) Objekte
//! einspielen, verzögert sichtbare Effekte simulieren und Lesefehler injizieren.

use super::{LedgerError, LedgerGateway};
use crate::config::ClientConfig;
use crate::models::batch::BatchStatus;
use crate::models::identifier::{Address, ObjectId};
use crate::models::ledger_object::{LedgerObject, ObjectContent, ObjectRead};
use crate::models::transaction::{
    CreatedObject, ExecutionOutcome, ExecutionStatus, SignedTransaction, TransactionCall,
    TransactionDigest, TransactionEffects,
};
use crate::services::crypto_utils;
use crate::services::field_access;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Abort-Code des Vertrags bei einem unzulässigen Statusübergang.
pub const E_INVALID_STATUS: u64 = 1;
/// Abort-Code, wenn das übergebene Objekt keine Charge ist.
pub const E_NOT_A_BATCH: u64 = 2;

struct PendingEffects {
    effects: TransactionEffects,
    hidden_polls: u32,
}

#[derive(Default)]
struct LedgerState {
    objects: HashMap<ObjectId, LedgerObject>,
    effects: HashMap<TransactionDigest, PendingEffects>,
    failing_reads: HashMap<ObjectId, String>,
    unavailable: bool,
    effects_lag: u32,
    batch_read_limit: Option<usize>,
    submitted: usize,
}

/// Ein Ledger, der vollständig im Speicher lebt.
pub struct InMemoryLedger {
    type_prefix: String,
    batch_type_name: String,
    record_type_name: String,
    state: RwLock<LedgerState>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl InMemoryLedger {
    /// Erzeugt einen leeren Ledger für das Paket und die Typnamen aus `config`.
    pub fn new(config: &ClientConfig) -> Self {
        let package = config
            .package()
            .map(|id| id.to_string())
            .unwrap_or_else(|_| config.package_id.clone());
        Self {
            type_prefix: format!("{}::{}", package, config.module_name),
            batch_type_name: config.batch_type_name.clone(),
            record_type_name: config.record_type_name.clone(),
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Voller Typname der Chargen-Objekte dieses Ledgers.
    pub fn batch_type(&self) -> String {
        format!("{}::{}", self.type_prefix, self.batch_type_name)
    }

    /// Voller Typname der StatusRecord-Objekte dieses Ledgers.
    pub fn record_type(&self) -> String {
        format!("{}::{}", self.type_prefix, self.record_type_name)
    }

    /// Legt ein beliebiges Objekt ab (ersetzt ein vorhandenes mit derselben ID).
    pub async fn insert_object(&self, object: LedgerObject) {
        let mut state = self.state.write().await;
        state.objects.insert(object.object_id.clone(), object);
    }

    /// Lässt jedes Lesen von `id` mit `reason` fehlschlagen.
    pub async fn fail_reads_for(&self, id: &ObjectId, reason: impl Into<String>) {
        let mut state = self.state.write().await;
        state.failing_reads.insert(id.clone(), reason.into());
    }

    /// Simuliert einen nicht erreichbaren Ledger.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Die Effekte neuer Transaktionen bleiben für `polls` Abfragen unsichtbar.
    pub async fn set_effects_lag(&self, polls: u32) {
        self.state.write().await.effects_lag = polls;
    }

    /// Kürzt die Antwort von `read_objects_batch` auf höchstens `limit` Positionen.
    pub async fn limit_batch_reads(&self, limit: Option<usize>) {
        self.state.write().await.batch_read_limit = limit;
    }

    /// Anzahl der angenommenen Transaktionen.
    pub async fn submitted_count(&self) -> usize {
        self.state.read().await.submitted
    }

    fn derive_object_id(digest: &TransactionDigest, index: u8) -> ObjectId {
        ObjectId::from_bytes(&crypto_utils::hash_bytes(format!("{}:{}", digest, index)))
    }

    fn read_one(state: &LedgerState, id: &ObjectId) -> ObjectRead {
        if let Some(reason) = state.failing_reads.get(id) {
            return ObjectRead::Failed {
                object_id: id.clone(),
                error: reason.clone(),
            };
        }
        match state.objects.get(id) {
            Some(object) => ObjectRead::Found(object.clone()),
            None => ObjectRead::NotFound(id.clone()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn status_record(
        &self,
        id: &ObjectId,
        batch_id: &ObjectId,
        status: BatchStatus,
        actor: &Address,
        location_info: &str,
        phone: &str,
        note: &str,
        timestamp_ms: i64,
    ) -> LedgerObject {
        LedgerObject::new(
            id.clone(),
            self.record_type(),
            json!({
                "id": id.to_string(),
                "batch_id": batch_id.to_string(),
                "status": status.code(),
                "actor": actor.to_string(),
                "location_info": location_info,
                "phone": phone,
                "note": note,
                "timestamp": timestamp_ms.to_string(),
            }),
        )
    }

    /// Führt einen Aufruf aus. `Err` enthält den Abort-Text der fehlgeschlagenen Ausführung;
    /// in diesem Fall bleibt der Zustand unverändert.
    fn execute(
        &self,
        state: &mut LedgerState,
        transaction: &SignedTransaction,
        digest: &TransactionDigest,
    ) -> Result<Vec<CreatedObject>, String> {
        let data = &transaction.data;
        match &data.call {
            TransactionCall::CreateRecord {
                medicine_code,
                producer_name,
                receiver_company,
                encrypted_info,
            } => {
                let batch_id = Self::derive_object_id(digest, 0);
                let record_id = Self::derive_object_id(digest, 1);
                let record = self.status_record(
                    &record_id,
                    &batch_id,
                    BatchStatus::Created,
                    &data.sender,
                    producer_name,
                    "",
                    &format!("Receiver: {}", receiver_company),
                    data.created_at_ms,
                );
                let batch = LedgerObject::new(
                    batch_id.clone(),
                    self.batch_type(),
                    json!({
                        "id": batch_id.to_string(),
                        "medicine_code": medicine_code,
                        "producer": data.sender.to_string(),
                        "producer_name": producer_name,
                        "receiver_company": receiver_company,
                        "encrypted_info": encrypted_info,
                        "current_status": BatchStatus::Created.code(),
                        "history": [record_id.to_string()],
                    }),
                );
                state.objects.insert(batch_id.clone(), batch);
                state.objects.insert(record_id.clone(), record);
                Ok(vec![
                    CreatedObject {
                        object_id: batch_id,
                        object_type: self.batch_type(),
                    },
                    CreatedObject {
                        object_id: record_id,
                        object_type: self.record_type(),
                    },
                ])
            }
            TransactionCall::UpdateRecordShipping {
                batch_id,
                carrier_name,
                carrier_phone,
                location,
                ..
            } => self.advance(
                state,
                digest,
                batch_id,
                BatchStatus::Created,
                BatchStatus::Shipping,
                &data.sender,
                location,
                carrier_phone,
                &format!("Carrier: {}", carrier_name),
                data.created_at_ms,
            ),
            TransactionCall::CompleteRecordDelivery {
                batch_id,
                pharmacy_name,
                pharmacy_phone,
                location,
                ..
            } => self.advance(
                state,
                digest,
                batch_id,
                BatchStatus::Shipping,
                BatchStatus::Delivered,
                &data.sender,
                location,
                pharmacy_phone,
                &format!("Pharmacy: {}", pharmacy_name),
                data.created_at_ms,
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn advance(
        &self,
        state: &mut LedgerState,
        digest: &TransactionDigest,
        batch_id: &ObjectId,
        expected: BatchStatus,
        next: BatchStatus,
        actor: &Address,
        location: &str,
        phone: &str,
        note: &str,
        timestamp_ms: i64,
    ) -> Result<Vec<CreatedObject>, String> {
        let abort = |code: u64| format!("MoveAbort(supply_chain, {})", code);

        let batch = state
            .objects
            .get(batch_id)
            .filter(|o| o.is_type(&self.batch_type_name))
            .ok_or_else(|| abort(E_NOT_A_BATCH))?;
        let current = batch
            .fields()
            .and_then(field_access::batch_status_value)
            .and_then(field_access::value_as_u64)
            .and_then(BatchStatus::from_code)
            .unwrap_or_default();
        if current != expected {
            return Err(abort(E_INVALID_STATUS));
        }

        let record_id = Self::derive_object_id(digest, 0);
        let record = self.status_record(
            &record_id, batch_id, next, actor, location, phone, note, timestamp_ms,
        );

        let mut updated = batch.clone();
        if let Some(content) = updated.content.as_mut() {
            if let Value::Object(fields) = &mut content.fields {
                fields.insert("current_status".to_string(), json!(next.code()));
                match fields.get_mut("history") {
                    Some(Value::Array(history)) => history.push(json!(record_id.to_string())),
                    _ => {
                        fields.insert("history".to_string(), json!([record_id.to_string()]));
                    }
                }
            }
        }
        updated.version += 1;

        state.objects.insert(batch_id.clone(), updated);
        state.objects.insert(record_id.clone(), record);
        Ok(vec![CreatedObject {
            object_id: record_id,
            object_type: self.record_type(),
        }])
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn read_object(&self, id: &ObjectId) -> Result<Option<LedgerObject>, LedgerError> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(LedgerError::Unavailable("in-memory ledger offline".to_string()));
        }
        match Self::read_one(&state, id) {
            ObjectRead::Found(object) => Ok(Some(object)),
            ObjectRead::NotFound(_) => Ok(None),
            ObjectRead::Failed { error, .. } => Err(LedgerError::Unavailable(error)),
        }
    }

    async fn read_objects_batch(&self, ids: &[ObjectId]) -> Result<Vec<ObjectRead>, LedgerError> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(LedgerError::Unavailable("in-memory ledger offline".to_string()));
        }
        let limit = state.batch_read_limit.unwrap_or(ids.len());
        Ok(ids
            .iter()
            .take(limit)
            .map(|id| Self::read_one(&state, id))
            .collect())
    }

    async fn submit_transaction(
        &self,
        transaction: SignedTransaction,
    ) -> Result<TransactionDigest, LedgerError> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(LedgerError::Unavailable("in-memory ledger offline".to_string()));
        }

        transaction
            .verify()
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;

        let expected_target = format!(
            "{}::{}",
            self.type_prefix,
            transaction.data.call.function_name()
        );
        if transaction.data.target != expected_target {
            return Err(LedgerError::Rejected(format!(
                "unknown call target {}",
                transaction.data.target
            )));
        }

        let digest = transaction
            .digest()
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
        if state.effects.contains_key(&digest) {
            return Err(LedgerError::Rejected(format!("duplicate transaction {}", digest)));
        }

        let (status, created) = match self.execute(&mut state, &transaction, &digest) {
            Ok(created) => {
                debug!(%digest, created = created.len(), "Executed transaction");
                let status = ExecutionStatus {
                    status: ExecutionOutcome::Success,
                    error: None,
                };
                (status, created)
            }
            Err(error) => {
                warn!(%digest, %error, "Transaction aborted");
                let status = ExecutionStatus {
                    status: ExecutionOutcome::Failure,
                    error: Some(error),
                };
                (status, Vec::new())
            }
        };

        let hidden_polls = state.effects_lag;
        state.effects.insert(
            digest.clone(),
            PendingEffects {
                effects: TransactionEffects {
                    digest: digest.clone(),
                    status,
                    created,
                },
                hidden_polls,
            },
        );
        state.submitted += 1;
        Ok(digest)
    }

    async fn transaction_effects(
        &self,
        digest: &TransactionDigest,
    ) -> Result<Option<TransactionEffects>, LedgerError> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(LedgerError::Unavailable("in-memory ledger offline".to_string()));
        }
        match state.effects.get_mut(digest) {
            None => Ok(None),
            Some(pending) if pending.hidden_polls > 0 => {
                pending.hidden_polls -= 1;
                Ok(None)
            }
            Some(pending) => Ok(Some(pending.effects.clone())),
        }
    }
}

impl InMemoryLedger {
    /// Legt ein Objekt ohne Inhalt ab, wie es ein noch nicht indizierter Eintrag liefert.
    pub async fn insert_without_content(&self, id: &ObjectId) {
        self.insert_object(LedgerObject {
            object_id: id.clone(),
            version: 1,
            content: None,
        })
        .await;
    }

    /// Legt ein Objekt mit beliebigem Typ und rohen Feldern ab.
    pub async fn insert_raw(&self, id: &ObjectId, type_name: &str, fields: Value) {
        self.insert_object(LedgerObject {
            object_id: id.clone(),
            version: 1,
            content: Some(ObjectContent {
                type_name: type_name.to_string(),
                fields,
            }),
        })
        .await;
    }
}
