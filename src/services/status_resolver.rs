//! # src/services/status_resolver.rs
//!
//! Rekonstruiert die Zeitleiste einer Charge (created → shipping → delivered) aus dem
//! Chargen-Objekt und seinen unabhängig erzeugten StatusRecords.
//!
//! Die Rekonstruktion ist tolerant: fehlende, defekte oder noch nicht indizierte Einträge
//! werden als `PartialDataWarning` protokolliert und übersprungen, statt die gesamte
//! Abfrage scheitern zu lassen. Einträge werden nach ihrem eigenen `status`-Feld
//! einsortiert, nicht nach ihrer Position in der History.

use crate::config::ClientConfig;
use crate::ledger::{LedgerError, LedgerGateway};
use crate::models::batch::{
    BatchStatus, MedicineBatch, PartialDataWarning, RecordStatus, ResolvedBatch, StatusRecord,
};
use crate::models::identifier::{IdentifierError, ObjectId};
use crate::models::ledger_object::{LedgerObject, ObjectRead};
use crate::services::field_access::{self, HistoryEntry};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fehler, die eine Rekonstruktion abbrechen.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid batch identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Batch {0} not found.")]
    BatchNotFound(ObjectId),

    #[error("Object {0} has no readable content.")]
    MissingContent(ObjectId),

    /// Die ID gehört zu einem anderen Objekttyp, z.B. einem StatusRecord.
    #[error("Object {object_id} is a '{found_type}', not a batch.{}", hint_suffix(.batch_id))]
    WrongRecordKind {
        object_id: ObjectId,
        found_type: String,
        /// Die Charge, auf die das Objekt verweist, falls bekannt.
        batch_id: Option<ObjectId>,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

fn hint_suffix(batch_id: &Option<ObjectId>) -> String {
    match batch_id {
        Some(id) => format!(" Did you mean batch {}?", id),
        None => String::new(),
    }
}

impl ResolveError {
    /// Kann ein erneuter Versuch später Erfolg haben?
    ///
    /// `BatchNotFound` zählt dazu, da frisch erzeugte Objekte verzögert sichtbar werden.
    pub fn is_retryable(&self) -> bool {
        match self {
            ResolveError::BatchNotFound(_) => true,
            ResolveError::Ledger(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Das gelesene Chargen-Objekt samt der Auffälligkeiten beim Lesen.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub batch: MedicineBatch,
    /// Der beim Producer hinterlegte Empfänger, falls das Objekt ihn trägt.
    pub receiver_company: Option<String>,
    /// Der versiegelte Lieferdaten-Umschlag, falls vorhanden.
    pub encrypted_info: Option<String>,
    pub warnings: Vec<PartialDataWarning>,
}

/// Liest Chargen über ein `LedgerGateway` und baut ihre Zeitleiste auf.
///
/// Hält keinen veränderlichen Zustand; parallele Aufrufe sind unabhängig.
pub struct BatchStatusResolver<G: LedgerGateway + ?Sized> {
    gateway: Arc<G>,
    batch_type_name: String,
    record_type_name: String,
}

impl<G: LedgerGateway + ?Sized> Clone for BatchStatusResolver<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            batch_type_name: self.batch_type_name.clone(),
            record_type_name: self.record_type_name.clone(),
        }
    }
}

impl<G: LedgerGateway + ?Sized> BatchStatusResolver<G> {
    /// Erzeugt einen Resolver mit den Standard-Typnamen.
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_config(gateway, &ClientConfig::default())
    }

    /// Erzeugt einen Resolver mit den Typnamen aus `config`.
    pub fn with_config(gateway: Arc<G>, config: &ClientConfig) -> Self {
        Self {
            gateway,
            batch_type_name: config.batch_type_name.clone(),
            record_type_name: config.record_type_name.clone(),
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Rekonstruiert die Zeitleiste zu einer vom Benutzer eingegebenen ID.
    ///
    /// Die ID wird vor jedem Lesezugriff validiert.
    pub async fn resolve(&self, raw_id: &str) -> Result<ResolvedBatch, ResolveError> {
        let id = ObjectId::parse(raw_id)?;
        self.resolve_id(&id).await
    }

    /// Rekonstruiert die Zeitleiste zu einer bereits validierten ID.
    pub async fn resolve_id(&self, id: &ObjectId) -> Result<ResolvedBatch, ResolveError> {
        let summary = self.read_summary(id).await?;
        let mut resolved = ResolvedBatch::metadata_only(&summary.batch);
        resolved.warnings = summary.warnings;

        if summary.batch.history_ids.is_empty() {
            debug!(batch_id = %id, "Batch has no history records yet");
            return Ok(resolved);
        }

        let ids = &summary.batch.history_ids;
        let reads = self.gateway.read_objects_batch(ids).await?;
        if reads.len() < ids.len() {
            warn!(
                batch_id = %id,
                requested = ids.len(),
                returned = reads.len(),
                "Batch read returned fewer entries than requested"
            );
        }

        for (index, record_id) in ids.iter().enumerate() {
            match reads.get(index) {
                Some(ObjectRead::Found(object)) => {
                    self.classify_record(&mut resolved, record_id, object)
                }
                Some(ObjectRead::NotFound(_)) => push_warning(
                    &mut resolved,
                    PartialDataWarning::RecordUnavailable {
                        record_id: record_id.clone(),
                        reason: "not found".to_string(),
                    },
                ),
                Some(ObjectRead::Failed { error, .. }) => push_warning(
                    &mut resolved,
                    PartialDataWarning::RecordUnavailable {
                        record_id: record_id.clone(),
                        reason: error.clone(),
                    },
                ),
                None => push_warning(
                    &mut resolved,
                    PartialDataWarning::RecordUnavailable {
                        record_id: record_id.clone(),
                        reason: "missing from batch response".to_string(),
                    },
                ),
            }
        }

        info!(
            batch_id = %id,
            status = %resolved.current_status,
            stages = resolved.populated_stages(),
            warnings = resolved.warnings.len(),
            "Resolved batch timeline"
        );
        Ok(resolved)
    }

    /// Liest nur das Chargen-Objekt (Code, Status, History-IDs), ohne die Einträge zu laden.
    pub async fn read_summary(&self, id: &ObjectId) -> Result<BatchSummary, ResolveError> {
        let object = self
            .gateway
            .read_object(id)
            .await?
            .ok_or_else(|| ResolveError::BatchNotFound(id.clone()))?;

        let fields = object
            .fields()
            .ok_or_else(|| ResolveError::MissingContent(id.clone()))?;
        self.check_kind(&object, fields)?;

        let mut warnings = Vec::new();
        let current_status = match field_access::batch_status_value(fields) {
            None => BatchStatus::Uninitialized,
            Some(value) => match field_access::value_as_u64(value).and_then(BatchStatus::from_code) {
                Some(status) => status,
                None => {
                    let warning = PartialDataWarning::UnknownBatchStatus {
                        raw: field_access::describe_value(Some(value)),
                    };
                    warn!(batch_id = %id, %warning, "Treating batch as uninitialized");
                    warnings.push(warning);
                    BatchStatus::Uninitialized
                }
            },
        };

        let mut history_ids = Vec::new();
        for (index, entry) in field_access::history_entries(fields).into_iter().enumerate() {
            match entry {
                HistoryEntry::Valid(record_id) => history_ids.push(record_id),
                HistoryEntry::Malformed(raw) => {
                    let warning = PartialDataWarning::MalformedHistoryId { index, raw };
                    warn!(batch_id = %id, index, %warning, "Skipping history entry");
                    warnings.push(warning);
                }
            }
        }

        Ok(BatchSummary {
            batch: MedicineBatch {
                id: id.clone(),
                medicine_code: field_access::medicine_code(fields),
                current_status,
                history_ids,
            },
            receiver_company: field_access::string_field(fields, field_access::RECEIVER_COMPANY_FIELD)
                .filter(|s| !s.trim().is_empty()),
            encrypted_info: field_access::first_present(fields, field_access::ENVELOPE_FIELDS)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
            warnings,
        })
    }

    /// Weist Objekte zurück, die keine Charge sind.
    ///
    /// Ein StatusRecord wird immer abgelehnt (mit Verweis auf seine Charge, falls
    /// vorhanden). Unbekannte Typnamen werden akzeptiert, solange das Objekt
    /// chargentypische Felder trägt.
    fn check_kind(
        &self,
        object: &LedgerObject,
        fields: &Map<String, Value>,
    ) -> Result<(), ResolveError> {
        let type_name = object.type_name().unwrap_or_default();
        if object.is_type(&self.batch_type_name) {
            return Ok(());
        }

        let is_record = object.is_type(&self.record_type_name);
        let looks_like_batch = field_access::first_present(fields, field_access::HISTORY_FIELDS)
            .is_some()
            || field_access::medicine_code(fields).is_some();
        if !is_record && looks_like_batch {
            debug!(
                object_id = %object.object_id,
                type_name,
                "Accepting batch-like object of unexpected type"
            );
            return Ok(());
        }

        let batch_id = if is_record {
            fields
                .get(field_access::RECORD_BATCH_REF_FIELD)
                .and_then(Value::as_str)
                .and_then(|raw| ObjectId::parse(raw).ok())
        } else {
            None
        };
        Err(ResolveError::WrongRecordKind {
            object_id: object.object_id.clone(),
            found_type: type_name.to_string(),
            batch_id,
        })
    }

    fn classify_record(
        &self,
        resolved: &mut ResolvedBatch,
        record_id: &ObjectId,
        object: &LedgerObject,
    ) {
        let Some(fields) = object.fields() else {
            push_warning(
                resolved,
                PartialDataWarning::MissingContent {
                    record_id: record_id.clone(),
                },
            );
            return;
        };

        let raw_status = fields.get(field_access::RECORD_STATUS_FIELD);
        let Some(status) = raw_status
            .and_then(field_access::value_as_u64)
            .and_then(RecordStatus::from_code)
        else {
            push_warning(
                resolved,
                PartialDataWarning::UnknownRecordStatus {
                    record_id: record_id.clone(),
                    raw: field_access::describe_value(raw_status),
                },
            );
            return;
        };

        let record = StatusRecord {
            record_id: record_id.clone(),
            status,
            actor: field_access::string_field(fields, field_access::RECORD_ACTOR_FIELD)
                .unwrap_or_default(),
            location_info: field_access::string_field(fields, field_access::RECORD_LOCATION_FIELD)
                .unwrap_or_default(),
            phone: field_access::normalize_phone(
                field_access::string_field(fields, field_access::RECORD_PHONE_FIELD).as_deref(),
            ),
            note: field_access::string_field(fields, field_access::RECORD_NOTE_FIELD)
                .unwrap_or_default(),
            timestamp: field_access::record_time(fields.get(field_access::RECORD_TIMESTAMP_FIELD)),
        };

        let slot = resolved.stage_slot(status);
        if let Some(previous) = slot.replace(record) {
            push_warning(
                resolved,
                PartialDataWarning::DuplicateStatus {
                    status,
                    kept: record_id.clone(),
                    replaced: previous.record_id,
                },
            );
        }
    }
}

fn push_warning(resolved: &mut ResolvedBatch, warning: PartialDataWarning) {
    warn!(batch_id = %resolved.batch_id, %warning, "Partial batch data");
    resolved.warnings.push(warning);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_kind_message_carries_hint() {
        let record = ObjectId::parse(&"1".repeat(64)).unwrap();
        let batch = ObjectId::parse(&"2".repeat(64)).unwrap();
        let err = ResolveError::WrongRecordKind {
            object_id: record,
            found_type: "0x2::supply_chain::StatusRecord".into(),
            batch_id: Some(batch.clone()),
        };
        assert!(err.to_string().contains(&batch.to_string()));
        assert!(!err.is_retryable());
        assert!(ResolveError::BatchNotFound(batch).is_retryable());
    }
}
