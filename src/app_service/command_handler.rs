//! # src/app_service/command_handler.rs
//!
//! Enthält die schreibenden Aktionen des `MedTrackService`. Jede Aktion setzt eine
//! geladene Identität voraus und prüft vorher die Zugriffsregel.

use super::MedTrackService;
use crate::error::MedTrackError;
use crate::models::transaction::TransactionDigest;
use crate::services::order_flows::{
    self, Confirmation, CreateOrderRequest, DeliveryConfirmation, ShippingUpdate,
};

impl MedTrackService {
    /// Producer: legt eine neue Charge an und liefert den Transaktions-Digest.
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<TransactionDigest, MedTrackError> {
        let identity = self.authorized_identity()?;
        order_flows::create_order(self.gateway.as_ref(), identity, &self.config, request).await
    }

    /// Producer: legt eine Charge an und wartet auf die Bestätigung.
    ///
    /// # Returns
    /// `Confirmation::Confirmed` mit der ID der neuen Charge, oder
    /// `Confirmation::ResolutionPending`, wenn die Effekte noch nicht sichtbar sind.
    pub async fn create_order_and_confirm(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<Confirmation, MedTrackError> {
        let digest = self.create_order(request).await?;
        self.await_confirmation(&digest).await
    }

    /// Carrier: übernimmt eine Charge.
    pub async fn update_shipping(
        &self,
        update: &ShippingUpdate,
    ) -> Result<TransactionDigest, MedTrackError> {
        let identity = self.authorized_identity()?;
        order_flows::update_shipping(&self.gateway, identity, &self.config, update).await
    }

    /// Pharmacy: bestätigt den Empfang einer Charge.
    pub async fn confirm_delivery(
        &self,
        confirmation: &DeliveryConfirmation,
    ) -> Result<TransactionDigest, MedTrackError> {
        let identity = self.authorized_identity()?;
        order_flows::confirm_delivery(&self.gateway, identity, &self.config, confirmation).await
    }
}
