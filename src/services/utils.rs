//! # utils.rs
//!
//! Enthält allgemeine Hilfsfunktionen, z.B. für Zeitstempel und kanonische Serialisierung.

use crate::models::batch::RecordTime;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json_canonicalizer::to_string;

/// Serialisiert eine beliebige `Serialize`-bare Struktur in einen kanonischen JSON-String
/// gemäß RFC 8785 (JCS - JSON Canonicalization Scheme).
///
/// Schlüssel sind alphabetisch sortiert und es gibt keine überflüssigen Leerzeichen.
/// Derselbe logische Inhalt ergibt damit immer denselben Hash und dieselbe Signatur.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    to_string(value)
}

/// Millisekunden seit Unix-Epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Wandelt einen Millisekunden-Zeitstempel des Ledgers in eine `RecordTime` um.
///
/// `0`, negative und nicht darstellbare Werte ergeben `RecordTime::Unknown`.
pub fn record_time_from_millis(millis: i64) -> RecordTime {
    if millis <= 0 {
        return RecordTime::Unknown;
    }
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(RecordTime::At)
        .unwrap_or(RecordTime::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn record_time_conversion() {
        let expected = Utc.with_ymd_and_hms(2025, 12, 1, 8, 30, 0).unwrap();
        assert_eq!(
            record_time_from_millis(expected.timestamp_millis()),
            RecordTime::At(expected)
        );
        assert_eq!(record_time_from_millis(0), RecordTime::Unknown);
        assert_eq!(record_time_from_millis(-5), RecordTime::Unknown);
        assert_eq!(record_time_from_millis(i64::MAX), RecordTime::Unknown);
    }
}
