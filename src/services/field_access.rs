//! # src/services/field_access.rs
//!
//! Eine einheitliche Zugriffsschicht auf die Felder von Ledger-Objekten.
//!
//! Verschiedene Vertragsversionen verwenden unterschiedliche Feldnamen (`history`,
//! `history_ids`, `records`, ...) und kodieren `u64`-Werte teils als Zahl, teils als
//! Dezimal-String. Alle Leser gehen über diese Funktionen, damit die Namensauflösung an
//! genau einer Stelle definiert ist. Der kanonische Name steht jeweils an erster Stelle.

use crate::models::batch::RecordTime;
use crate::models::identifier::ObjectId;
use crate::services::utils::record_time_from_millis;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

pub const MEDICINE_CODE_FIELDS: &[&str] = &["medicine_code", "code", "medicineCode"];
pub const BATCH_STATUS_FIELDS: &[&str] = &["current_status", "status"];
pub const HISTORY_FIELDS: &[&str] = &["history", "history_ids", "records"];
pub const ENVELOPE_FIELDS: &[&str] = &["encrypted_info", "info"];
pub const RECEIVER_COMPANY_FIELD: &str = "receiver_company";

pub const RECORD_STATUS_FIELD: &str = "status";
pub const RECORD_ACTOR_FIELD: &str = "actor";
pub const RECORD_LOCATION_FIELD: &str = "location_info";
pub const RECORD_PHONE_FIELD: &str = "phone";
pub const RECORD_NOTE_FIELD: &str = "note";
pub const RECORD_TIMESTAMP_FIELD: &str = "timestamp";
/// Querverweis eines StatusRecords auf seine Charge.
pub const RECORD_BATCH_REF_FIELD: &str = "batch_id";

lazy_static! {
    static ref DISPLAY_PHONE_RE: Regex = Regex::new(r"^(\+84|0)[0-9]{9,10}$").unwrap();
}

/// `null` und leere Strings gelten als nicht gesetzt.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Liefert den Wert des ersten gesetzten Feldes aus `names`.
///
/// Ein leeres kanonisches Feld verdeckt keinen Alias: die Suche geht dann beim nächsten
/// Namen weiter.
pub fn first_present<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| !is_blank(value))
}

/// Liest einen `u64` aus einer JSON-Zahl oder einem Dezimal-String.
pub fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Liest einen `i64` aus einer JSON-Zahl oder einem Dezimal-String.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Stellt einen Feldwert für Warnungen und Logs dar.
pub fn describe_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "<missing>".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Die Medikamentenkennung einer Charge; leere Werte zählen als fehlend.
pub fn medicine_code(fields: &Map<String, Value>) -> Option<String> {
    match first_present(fields, MEDICINE_CODE_FIELDS)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Der rohe Statuswert einer Charge.
///
/// Eine `0` im kanonischen Feld fällt auf den Alias zurück; nur wenn kein Feld einen
/// anderen Wert trägt, bleibt es bei `0`.
pub fn batch_status_value(fields: &Map<String, Value>) -> Option<&Value> {
    BATCH_STATUS_FIELDS
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| !is_blank(value) && value_as_u64(value) != Some(0))
        .or_else(|| first_present(fields, BATCH_STATUS_FIELDS))
}

/// Ein einzelner History-Eintrag: gültige ID oder der Rohtext eines ungültigen Eintrags.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Valid(ObjectId),
    Malformed(String),
}

/// Die History-Liste einer Charge.
///
/// Einträge dürfen reine ID-Strings oder Objekte der Form `{"id": "0x…"}` sein.
/// Fehlt das Feld oder ist es kein Array, ist die History leer.
pub fn history_entries(fields: &Map<String, Value>) -> Vec<HistoryEntry> {
    let Some(Value::Array(items)) = first_present(fields, HISTORY_FIELDS) else {
        return Vec::new();
    };
    items.iter().map(history_entry).collect()
}

fn history_entry(item: &Value) -> HistoryEntry {
    let raw = match item {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("id").and_then(Value::as_str),
        _ => None,
    };
    match raw.map(ObjectId::parse) {
        Some(Ok(id)) => HistoryEntry::Valid(id),
        _ => HistoryEntry::Malformed(describe_value(Some(item))),
    }
}

/// Wandelt einen Zeitstempel-Wert in eine `RecordTime`; alles Ungültige wird `Unknown`.
pub fn record_time(value: Option<&Value>) -> RecordTime {
    value
        .and_then(value_as_i64)
        .map(record_time_from_millis)
        .unwrap_or(RecordTime::Unknown)
}

/// Normalisiert eine Telefonnummer für die Anzeige.
///
/// Leere Werte ergeben `None`. Eine Nummer der Form `+84…`/`0…` mit 9-10 Folgeziffern
/// wird auf die lokale Schreibweise mit führender `0` gebracht; alles andere bleibt
/// (getrimmt) unverändert.
pub fn normalize_phone(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    if DISPLAY_PHONE_RE.is_match(trimmed) {
        if let Some(rest) = trimmed.strip_prefix("+84") {
            return Some(format!("0{}", rest));
        }
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn alias_resolution_prefers_canonical_name() {
        let fields = map(json!({"code": "B", "medicine_code": "A", "status": 2}));
        assert_eq!(medicine_code(&fields).as_deref(), Some("A"));
        assert_eq!(batch_status_value(&fields).and_then(value_as_u64), Some(2));

        let legacy = map(json!({"medicineCode": "C", "current_status": "3"}));
        assert_eq!(medicine_code(&legacy).as_deref(), Some("C"));
        assert_eq!(batch_status_value(&legacy).and_then(value_as_u64), Some(3));
    }

    #[test]
    fn empty_canonical_values_fall_through_to_aliases() {
        let fields = map(json!({
            "medicine_code": "  ",
            "code": "PhT-2025-12",
            "current_status": "0",
            "status": 2,
        }));
        assert_eq!(medicine_code(&fields).as_deref(), Some("PhT-2025-12"));
        assert_eq!(batch_status_value(&fields).and_then(value_as_u64), Some(2));

        let unset = map(json!({"medicine_code": "", "current_status": 0, "status": null}));
        assert_eq!(medicine_code(&unset), None);
        assert_eq!(batch_status_value(&unset).and_then(value_as_u64), Some(0));
    }

    #[test]
    fn history_accepts_strings_and_id_objects() {
        let id = "a".repeat(64);
        let fields = map(json!({"records": [format!("0x{}", id), {"id": id}, 42, "zz"]}));
        let entries = history_entries(&fields);
        assert_eq!(entries.len(), 4);
        assert!(matches!(entries[0], HistoryEntry::Valid(_)));
        assert_eq!(entries[0], entries[1]);
        assert_eq!(entries[2], HistoryEntry::Malformed("42".to_string()));
        assert_eq!(entries[3], HistoryEntry::Malformed("zz".to_string()));
        assert!(history_entries(&map(json!({}))).is_empty());
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone(Some("  +84987654321 ")).as_deref(), Some("0987654321"));
        assert_eq!(normalize_phone(Some("0987654321")).as_deref(), Some("0987654321"));
        assert_eq!(normalize_phone(Some("+1 555 0100")).as_deref(), Some("+1 555 0100"));
        assert_eq!(normalize_phone(Some("   ")), None);
        assert_eq!(normalize_phone(None), None);
    }

    #[test]
    fn timestamps_degrade_to_unknown() {
        assert_eq!(record_time(None), RecordTime::Unknown);
        assert_eq!(record_time(Some(&json!("not a number"))), RecordTime::Unknown);
        assert_eq!(record_time(Some(&json!(0))), RecordTime::Unknown);
        assert!(record_time(Some(&json!("1764577800000"))).as_datetime().is_some());
    }
}
