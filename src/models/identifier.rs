//! # src/models/identifier.rs
//!
//! Definiert die normalisierten Bezeichner des Ledgers: `ObjectId` für Objekte
//! (Batches, StatusRecords) und `Address` für Konten. Beide bestehen aus genau
//! 64 hexadezimalen Kleinbuchstaben; ein optionales `0x`-Präfix wird entfernt.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Anzahl der Hex-Zeichen eines vollständigen Bezeichners (32 Bytes).
pub const ID_HEX_LEN: usize = 64;

/// Fehler beim Parsen eines Bezeichners.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("Identifier is empty.")]
    Empty,

    #[error("Identifier must be {expected} hex characters, got {actual}.")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Identifier contains a non-hex character '{0}'.")]
    InvalidCharacter(char),
}

/// Normalisiert einen rohen Bezeichner: trimmen, `0x`/`0X` entfernen, klein schreiben, prüfen.
pub fn normalize_hex_id(raw: &str) -> Result<String, IdentifierError> {
    let trimmed = raw.trim();
    let bare = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if bare.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if let Some(bad) = bare.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(IdentifierError::InvalidCharacter(bad));
    }
    if bare.len() != ID_HEX_LEN {
        return Err(IdentifierError::InvalidLength {
            expected: ID_HEX_LEN,
            actual: bare.len(),
        });
    }
    Ok(bare.to_ascii_lowercase())
}

macro_rules! hex_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Parst und normalisiert einen Bezeichner aus beliebiger Schreibweise.
            pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
                normalize_hex_id(raw).map(Self)
            }

            /// Die nackte Form ohne Präfix, wie sie für Lookups verwendet wird.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Die Anzeigeform mit `0x`-Präfix.
            pub fn to_prefixed(&self) -> String {
                format!("0x{}", self.0)
            }

            /// Erzeugt einen Bezeichner aus 32 Rohbytes.
            pub fn from_bytes(bytes: &[u8; 32]) -> Self {
                Self(hex::encode(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_prefixed())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_identifier!(
    /// Bezeichner eines Ledger-Objekts (MedicineBatch, StatusRecord, Paket, Clock).
    ObjectId
);

hex_identifier!(
    /// Adresse eines Kontos (Producer, Carrier, Pharmacy).
    Address
);

impl ObjectId {
    /// Erweitert eine kurze System-ID wie `0x6` auf die volle Länge.
    pub fn from_short_hex(short: &str) -> Result<Self, IdentifierError> {
        let trimmed = short.trim();
        let bare = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if bare.len() > ID_HEX_LEN {
            return Err(IdentifierError::InvalidLength {
                expected: ID_HEX_LEN,
                actual: bare.len(),
            });
        }
        Self::parse(&format!("{:0>width$}", bare, width = ID_HEX_LEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOWER: &str = "54867e1a4cb4f5af1aa0156035d294b855597692fc8e7990c00c865cefafaad3";

    #[test]
    fn prefix_and_case_are_normalized() {
        let upper = format!("0x{}", LOWER.to_uppercase());
        let a = ObjectId::parse(&upper).unwrap();
        let b = ObjectId::parse(LOWER).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), LOWER);
        assert_eq!(a.to_string(), format!("0x{}", LOWER));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let id = ObjectId::parse(&format!("  0x{}\n", LOWER)).unwrap();
        assert_eq!(id.as_str(), LOWER);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(ObjectId::parse("   "), Err(IdentifierError::Empty));
        assert_eq!(ObjectId::parse("0x"), Err(IdentifierError::Empty));
        assert_eq!(
            ObjectId::parse("0xabc"),
            Err(IdentifierError::InvalidLength { expected: 64, actual: 3 })
        );
        let mut bad = LOWER.to_string();
        bad.replace_range(10..11, "g");
        assert_eq!(ObjectId::parse(&bad), Err(IdentifierError::InvalidCharacter('g')));
    }

    #[test]
    fn short_system_ids_are_padded() {
        let clock = ObjectId::from_short_hex("0x6").unwrap();
        assert_eq!(clock.as_str().len(), ID_HEX_LEN);
        assert!(clock.as_str().ends_with('6'));
        assert!(clock.as_str()[..63].chars().all(|c| c == '0'));
    }

    #[test]
    fn serde_uses_prefixed_form() {
        let id = ObjectId::parse(LOWER).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"0x{}\"", LOWER));
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
