//! # src/models/ledger_object.rs
//!
//! Die rohe Form eines vom Ledger gelesenen Objekts. Die Felder bleiben unstrukturiertes
//! JSON, da verschiedene Vertragsversionen unterschiedliche Feldnamen verwenden; die
//! Interpretation übernimmt `services::field_access`.

use crate::models::identifier::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typ und Felder eines Objekts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ObjectContent {
    /// Vollständiger Typname, z.B. `0x…::supply_chain::MedicineBatch`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Die Felder des Objekts; normalerweise ein JSON-Objekt.
    pub fields: Value,
}

/// Ein Objekt, wie es `LedgerGateway::read_object` liefert.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LedgerObject {
    pub object_id: ObjectId,
    pub version: u64,
    /// `None`, wenn der Ledger das Objekt kennt, aber (noch) keinen Inhalt liefert.
    pub content: Option<ObjectContent>,
}

impl LedgerObject {
    pub fn new(object_id: ObjectId, type_name: impl Into<String>, fields: Value) -> Self {
        Self {
            object_id,
            version: 1,
            content: Some(ObjectContent {
                type_name: type_name.into(),
                fields,
            }),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.type_name.as_str())
    }

    /// Die Felder als JSON-Objekt, falls vorhanden.
    pub fn fields(&self) -> Option<&serde_json::Map<String, Value>> {
        self.content.as_ref().and_then(|c| c.fields.as_object())
    }

    /// Prüft, ob der Typname mit `::<name>` endet (generische Parameter werden ignoriert).
    pub fn is_type(&self, name: &str) -> bool {
        self.type_name().map_or(false, |t| type_matches(t, name))
    }
}

pub(crate) fn type_matches(type_name: &str, name: &str) -> bool {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base == name || base.ends_with(&format!("::{}", name))
}

/// Ergebnis einer einzelnen Position in `read_objects_batch`.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectRead {
    Found(LedgerObject),
    NotFound(ObjectId),
    Failed { object_id: ObjectId, error: String },
}
