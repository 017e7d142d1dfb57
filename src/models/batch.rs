//! # src/models/batch.rs
//!
//! Definiert die Datenstrukturen einer Medikamenten-Charge (`MedicineBatch`), ihrer
//! Statusübergänge (`StatusRecord`) und der daraus rekonstruierten Zeitleiste
//! (`ResolvedBatch`).

use crate::models::identifier::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Der aktuelle Status einer Charge. Schreitet monoton 0 → 1 → 2 → 3 fort.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BatchStatus {
    #[default]
    Uninitialized = 0,
    Created = 1,
    Shipping = 2,
    Delivered = 3,
}

impl BatchStatus {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(BatchStatus::Uninitialized),
            1 => Some(BatchStatus::Created),
            2 => Some(BatchStatus::Shipping),
            3 => Some(BatchStatus::Delivered),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// `Delivered` ist der Endzustand; danach endet jedes Polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchStatus::Delivered)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BatchStatus::Uninitialized => "not initialized",
            BatchStatus::Created => "created",
            BatchStatus::Shipping => "in transit",
            BatchStatus::Delivered => "delivered",
        };
        f.write_str(label)
    }
}

/// Der Status, den ein einzelner `StatusRecord` markiert.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordStatus {
    Created = 1,
    Shipping = 2,
    Delivered = 3,
}

impl RecordStatus {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(RecordStatus::Created),
            2 => Some(RecordStatus::Shipping),
            3 => Some(RecordStatus::Delivered),
            _ => None,
        }
    }
}

/// Zeitpunkt eines Statusübergangs. Fehlende oder ungültige Werte werden zu `Unknown`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTime {
    At(DateTime<Utc>),
    Unknown,
}

impl RecordTime {
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordTime::At(dt) => Some(*dt),
            RecordTime::Unknown => None,
        }
    }
}

impl fmt::Display for RecordTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordTime::At(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            RecordTime::Unknown => f.write_str("N/A"),
        }
    }
}

/// Ein unveränderlicher Statusübergang einer Charge, wie er für die Anzeige aufbereitet wird.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    /// Die ID des Ledger-Objekts, aus dem der Eintrag stammt.
    pub record_id: ObjectId,
    pub status: RecordStatus,
    /// Das Konto, das den Übergang ausgelöst hat. Roh übernommen, da Altdaten abweichen können.
    pub actor: String,
    pub location_info: String,
    /// Normalisierte Telefonnummer; `None`, wenn keine angegeben wurde.
    pub phone: Option<String>,
    pub note: String,
    pub timestamp: RecordTime,
}

/// Die Zusammenfassung einer Charge, wie sie aus dem Batch-Objekt gelesen wird.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MedicineBatch {
    pub id: ObjectId,
    pub medicine_code: Option<String>,
    pub current_status: BatchStatus,
    /// StatusRecord-IDs in Erstellungsreihenfolge.
    pub history_ids: Vec<ObjectId>,
}

/// Nicht-fatale Auffälligkeiten, die während der Rekonstruktion protokolliert werden.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum PartialDataWarning {
    /// Ein Eintrag in `history` ist kein gültiger Bezeichner.
    MalformedHistoryId { index: usize, raw: String },
    /// Der Ledger lieferte für diese Position nichts oder einen Fehler.
    RecordUnavailable { record_id: ObjectId, reason: String },
    /// Der Eintrag hat keinen Inhalt oder keine Felder.
    MissingContent { record_id: ObjectId },
    /// Der Eintrag hat keinen oder einen unbekannten Statuscode.
    UnknownRecordStatus { record_id: ObjectId, raw: String },
    /// Das Batch-Objekt meldet einen unbekannten Statuscode.
    UnknownBatchStatus { raw: String },
    /// Zwei Einträge beanspruchen denselben Status; der spätere wurde übernommen.
    DuplicateStatus {
        status: RecordStatus,
        kept: ObjectId,
        replaced: ObjectId,
    },
}

impl fmt::Display for PartialDataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialDataWarning::MalformedHistoryId { index, raw } => {
                write!(f, "history entry #{} is not a valid id: {}", index, raw)
            }
            PartialDataWarning::RecordUnavailable { record_id, reason } => {
                write!(f, "record {} unavailable: {}", record_id, reason)
            }
            PartialDataWarning::MissingContent { record_id } => {
                write!(f, "record {} has no content", record_id)
            }
            PartialDataWarning::UnknownRecordStatus { record_id, raw } => {
                write!(f, "record {} has unknown status {}", record_id, raw)
            }
            PartialDataWarning::UnknownBatchStatus { raw } => {
                write!(f, "batch reports unknown status {}", raw)
            }
            PartialDataWarning::DuplicateStatus { status, kept, replaced } => write!(
                f,
                "duplicate {:?} records: kept {}, replaced {}",
                status, kept, replaced
            ),
        }
    }
}

/// Das Ergebnis einer Rekonstruktion: Metadaten plus bis zu drei Stufen.
///
/// Fehlende Stufen sind ein legitimer Zustand ("pending"), kein Fehler.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBatch {
    pub batch_id: ObjectId,
    pub medicine_code: Option<String>,
    pub current_status: BatchStatus,
    pub created: Option<StatusRecord>,
    pub shipping: Option<StatusRecord>,
    pub delivered: Option<StatusRecord>,
    pub warnings: Vec<PartialDataWarning>,
}

impl ResolvedBatch {
    /// Eine Charge ohne Stufeneinträge, z.B. direkt nach der Erstellung.
    pub fn metadata_only(batch: &MedicineBatch) -> Self {
        Self {
            batch_id: batch.id.clone(),
            medicine_code: batch.medicine_code.clone(),
            current_status: batch.current_status,
            created: None,
            shipping: None,
            delivered: None,
            warnings: Vec::new(),
        }
    }

    pub fn stage(&self, status: RecordStatus) -> Option<&StatusRecord> {
        match status {
            RecordStatus::Created => self.created.as_ref(),
            RecordStatus::Shipping => self.shipping.as_ref(),
            RecordStatus::Delivered => self.delivered.as_ref(),
        }
    }

    pub(crate) fn stage_slot(&mut self, status: RecordStatus) -> &mut Option<StatusRecord> {
        match status {
            RecordStatus::Created => &mut self.created,
            RecordStatus::Shipping => &mut self.shipping,
            RecordStatus::Delivered => &mut self.delivered,
        }
    }

    /// Anzahl der befüllten Stufen (0–3).
    pub fn populated_stages(&self) -> usize {
        [&self.created, &self.shipping, &self.delivered]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }
}
