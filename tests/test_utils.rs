//! # tests/test_utils.rs
//!
//! Zentrale Hilfsfunktionen für die Integrationstests: feste Test-Akteure und Bausteine
//! für Ledger-Objekte (auch absichtlich defekte).

#![allow(dead_code)]

use lazy_static::lazy_static;
use medtrack_lib::crypto_utils::generate_ed25519_keypair_for_tests;
use medtrack_lib::{
    ActiveIdentity, ClientConfig, CreateOrderRequest, DeliveryInfo, EncodedKeyPair,
    InMemoryLedger, ObjectId,
};
use serde_json::{json, Value};
use std::ops::Deref;
use std::sync::Arc;

/// Bündelt die Signatur-Identität eines Akteurs und sein Box-Schlüsselpaar.
#[derive(Clone)]
pub struct TestActor {
    pub identity: ActiveIdentity,
    pub box_keys: EncodedKeyPair,
}

impl Deref for TestActor {
    type Target = ActiveIdentity;

    fn deref(&self) -> &Self::Target {
        &self.identity
    }
}

fn actor_from_seed(seed: &str) -> TestActor {
    let (_, signing_key) = generate_ed25519_keypair_for_tests(seed);
    TestActor {
        identity: ActiveIdentity::from_signing_key(signing_key),
        box_keys: EncodedKeyPair::generate(),
    }
}

pub struct TestActors {
    pub producer: TestActor,
    pub carrier: TestActor,
    pub pharmacy: TestActor,
    pub outsider: TestActor,
}

lazy_static! {
    /// Initialisiert einmalig alle Akteure, sodass sie in allen Tests wiederverwendet werden können.
    pub static ref ACTORS: TestActors = TestActors {
        producer: actor_from_seed("producer"),
        carrier: actor_from_seed("carrier"),
        pharmacy: actor_from_seed("pharmacy"),
        outsider: actor_from_seed("outsider"),
    };
}

/// Eine Konfiguration ohne Wartezeiten beim Bestätigen.
pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.polling.interval_ms = 10;
    config.confirmation.initial_delay_ms = 0;
    config.confirmation.max_delay_ms = 0;
    config.confirmation.multiplier = 1.0;
    config.confirmation.jitter = false;
    config.confirmation.max_attempts = 3;
    config
}

pub fn new_ledger() -> Arc<InMemoryLedger> {
    Arc::new(InMemoryLedger::new(&test_config()))
}

/// Eine deterministische ID aus einem wiederholten Hex-Zeichen, z.B. `id('b')`.
pub fn id(c: char) -> ObjectId {
    ObjectId::parse(&c.to_string().repeat(64)).unwrap()
}

pub fn batch_fields(code: &str, status: u64, history: &[&ObjectId]) -> Value {
    json!({
        "medicine_code": code,
        "current_status": status,
        "receiver_company": "Long Chau Pharmacy",
        "history": history.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
    })
}

pub fn record_fields(status: u64, batch_id: &ObjectId, phone: &str, timestamp_ms: &str) -> Value {
    json!({
        "batch_id": batch_id.to_string(),
        "status": status,
        "actor": ACTORS.producer.address.to_string(),
        "location_info": "Ho Chi Minh City",
        "phone": phone,
        "note": "",
        "timestamp": timestamp_ms,
    })
}

pub async fn seed_batch(ledger: &InMemoryLedger, batch_id: &ObjectId, fields: Value) {
    ledger.insert_raw(batch_id, &ledger.batch_type(), fields).await;
}

pub async fn seed_record(ledger: &InMemoryLedger, record_id: &ObjectId, fields: Value) {
    ledger.insert_raw(record_id, &ledger.record_type(), fields).await;
}

/// Eine vollständige Charge mit den Stufen `created` und `shipping`.
pub async fn seed_shipping_batch(ledger: &InMemoryLedger) -> ObjectId {
    let batch_id = id('b');
    let created = id('1');
    let shipping = id('2');
    seed_record(ledger, &created, record_fields(1, &batch_id, "", "1764577800000")).await;
    seed_record(ledger, &shipping, record_fields(2, &batch_id, "+84912345678", "1764664200000")).await;
    seed_batch(ledger, &batch_id, batch_fields("PhT-2025-12", 2, &[&created, &shipping])).await;
    batch_id
}

pub fn sample_order(carrier_public_key: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        medicine_code: "PhT-2025-12".to_string(),
        producer_name: "DHG Pharma".to_string(),
        receiver_company: "Long Chau Pharmacy".to_string(),
        delivery: DeliveryInfo::new("123 Nguyen Trai Street, District 1", "0987654321"),
        carrier_public_key: carrier_public_key.to_string(),
    }
}
