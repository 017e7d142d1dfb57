//! # medtrack_core
//!
//! Die Kernlogik der Rückverfolgung von Medikamenten-Chargen über Producer, Carrier und
//! Pharmacy. Die Bibliothek stellt die vertrauliche Übermittlung der Lieferdaten an den
//! Carrier (Box-Verschlüsselung) und die Rekonstruktion der Status-Zeitleiste einer Charge
//! aus unabhängig erzeugten Ledger-Einträgen bereit.

// Deklariert die Hauptmodule der Bibliothek und macht sie öffentlich.
pub mod app_service;
pub mod authorization;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod retry;
pub mod services;

// Re-exportiert die wichtigsten öffentlichen Typen für eine einfachere Nutzung.

// Modelle
pub use models::batch::{
    BatchStatus, MedicineBatch, PartialDataWarning, RecordStatus, RecordTime, ResolvedBatch,
    StatusRecord,
};
pub use models::envelope::{DeliveryInfo, EncodedKeyPair, EncryptedEnvelope, KeyPair};
pub use models::identifier::{Address, IdentifierError, ObjectId};
pub use models::identity::ActiveIdentity;

// Services
pub use services::crypto_utils;
pub use services::utils;
pub use services::utils::to_canonical_json;
pub use services::confidential_fields::{
    open_delivery_envelope, open_delivery_info, seal_delivery_info,
};
pub use services::status_resolver::{BatchStatusResolver, ResolveError};
pub use services::order_flows::{
    Confirmation, CreateOrderRequest, DeliveryConfirmation, ShippingUpdate,
};

// Infrastruktur
pub use app_service::MedTrackService;
pub use config::ClientConfig;
pub use error::MedTrackError;
pub use ledger::{InMemoryLedger, LedgerError, LedgerGateway};
