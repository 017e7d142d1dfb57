//! # src/app_service/queries.rs
//!
//! Enthält alle lesenden Operationen des `MedTrackService`. Sie sind auch im Zustand
//! `Locked` verfügbar.

use super::MedTrackService;
use crate::error::MedTrackError;
use crate::models::batch::ResolvedBatch;
use crate::models::identifier::ObjectId;
use crate::models::transaction::TransactionDigest;
use crate::services::batch_watcher::{BatchWatcher, WatchOutcome};
use crate::services::order_flows::{self, Confirmation};
use tokio::sync::watch;

impl MedTrackService {
    /// Rekonstruiert die Zeitleiste einer Charge.
    ///
    /// # Arguments
    /// * `batch_id` - Die vom Benutzer eingegebene ID, mit oder ohne `0x`.
    pub async fn track_batch(&self, batch_id: &str) -> Result<ResolvedBatch, MedTrackError> {
        Ok(self.resolver().resolve(batch_id).await?)
    }

    /// Aktualisiert die Zeitleiste im Polling-Intervall der Konfiguration, bis die Charge
    /// zugestellt ist oder `shutdown` gesetzt wird.
    pub async fn watch_batch<F>(
        &self,
        batch_id: &str,
        shutdown: watch::Receiver<bool>,
        on_update: F,
    ) -> Result<WatchOutcome, MedTrackError>
    where
        F: FnMut(&ResolvedBatch),
    {
        let id = ObjectId::parse(batch_id)?;
        let watcher = BatchWatcher::new(self.resolver(), self.config.polling.interval());
        Ok(watcher.watch(&id, shutdown, on_update).await?)
    }

    /// Carrier: liest und öffnet die versiegelten Lieferdaten einer Charge.
    ///
    /// Der geheime Schlüssel wird nur für diesen Aufruf verwendet und nicht gespeichert.
    pub async fn reveal_delivery_info(
        &self,
        batch_id: &str,
        carrier_secret_key: &str,
    ) -> Result<String, MedTrackError> {
        order_flows::reveal_delivery_info(&self.gateway, &self.config, batch_id, carrier_secret_key)
            .await
    }

    /// Wartet mit dem konfigurierten Backoff auf die Effekte einer Transaktion.
    pub async fn await_confirmation(
        &self,
        digest: &TransactionDigest,
    ) -> Result<Confirmation, MedTrackError> {
        let policy = self.config.confirmation.retry_policy();
        order_flows::await_confirmation(self.gateway.as_ref(), &self.config, digest, &policy).await
    }
}
