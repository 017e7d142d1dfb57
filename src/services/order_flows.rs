//! # src/services/order_flows.rs
//!
//! Die schreibenden Abläufe der drei Rollen: der Producer legt eine Charge an, der
//! Carrier übernimmt sie, die Pharmacy bestätigt den Empfang. Jeder Ablauf validiert
//! die Eingaben, prüft den aktuellen Status der Charge, baut und signiert die
//! Transaktion und übermittelt sie über das übergebene `LedgerGateway`.
//!
//! Ledger und Identität werden explizit übergeben; es gibt keinen globalen Wallet-Kontext.

use crate::config::ClientConfig;
use crate::error::MedTrackError;
use crate::ledger::LedgerGateway;
use crate::models::batch::BatchStatus;
use crate::models::envelope::DeliveryInfo;
use crate::models::identifier::ObjectId;
use crate::models::identity::ActiveIdentity;
use crate::models::transaction::{
    SignedTransaction, TransactionCall, TransactionData, TransactionDigest, TransactionEffects,
};
use crate::retry::RetryPolicy;
use crate::services::confidential_fields;
use crate::services::input_validation::{
    validate_address, validate_batch_id, validate_company_name, validate_medicine_code,
    validate_phone_number, validate_receiver_company,
};
use crate::services::status_resolver::{BatchStatusResolver, BatchSummary};
use crate::services::utils::now_millis;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Batch {batch_id} is '{actual}', but this step requires '{expected}'.")]
    InvalidStatus {
        batch_id: ObjectId,
        expected: BatchStatus,
        actual: BatchStatus,
    },

    #[error("Transaction {digest} failed: {error}")]
    TransactionFailed {
        digest: TransactionDigest,
        error: String,
    },

    #[error("Batch {0} carries no sealed delivery info.")]
    MissingEnvelope(ObjectId),

    #[error("No active identity. Unlock the service before submitting transactions.")]
    Locked,
}

/// Eingaben des Producers für eine neue Charge.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub medicine_code: String,
    pub producer_name: String,
    pub receiver_company: String,
    /// Vertraulich; wird nur versiegelt übertragen.
    pub delivery: DeliveryInfo,
    /// Base64-kodierter öffentlicher Schlüssel des Carriers.
    pub carrier_public_key: String,
}

/// Eingaben des Carriers bei der Übernahme.
#[derive(Debug, Clone)]
pub struct ShippingUpdate {
    pub batch_id: String,
    pub carrier_name: String,
    pub carrier_phone: String,
    pub location: String,
}

/// Eingaben der Pharmacy bei der Empfangsbestätigung.
#[derive(Debug, Clone)]
pub struct DeliveryConfirmation {
    pub batch_id: String,
    pub pharmacy_name: String,
    pub pharmacy_phone: String,
    /// Wird gegen den beim Producer hinterlegten Empfänger geprüft, falls angegeben.
    pub receiver_company: Option<String>,
}

/// Ergebnis von `await_confirmation`.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    Confirmed {
        effects: TransactionEffects,
        /// Die neu erzeugte Charge (nur bei `create_record`).
        created_batch: Option<ObjectId>,
    },
    /// Die Effekte sind auch nach dem letzten Versuch noch nicht sichtbar.
    /// Der Aufrufer muss später erneut nachfragen.
    ResolutionPending { digest: TransactionDigest },
}

/// Baut und signiert eine Transaktion für `call`.
pub fn build_transaction(
    identity: &ActiveIdentity,
    config: &ClientConfig,
    call: TransactionCall,
) -> Result<SignedTransaction, MedTrackError> {
    let package = config.package()?;
    let data = TransactionData {
        sender: identity.address.clone(),
        target: call.target(&package, &config.module_name),
        call,
        gas_budget: config.gas_budget,
        created_at_ms: now_millis(),
    };
    Ok(SignedTransaction::sign(data, identity)?)
}

async fn submit<G: LedgerGateway + ?Sized>(
    gateway: &G,
    identity: &ActiveIdentity,
    config: &ClientConfig,
    call: TransactionCall,
) -> Result<TransactionDigest, MedTrackError> {
    let function = call.function_name();
    let transaction = build_transaction(identity, config, call)?;
    let digest = gateway.submit_transaction(transaction).await?;
    info!(%digest, function, sender = %identity.address, "Submitted transaction");
    Ok(digest)
}

async fn read_batch_with_status<G: LedgerGateway + ?Sized>(
    gateway: &Arc<G>,
    config: &ClientConfig,
    batch_id: &ObjectId,
    expected: BatchStatus,
) -> Result<BatchSummary, MedTrackError> {
    let resolver = BatchStatusResolver::with_config(Arc::clone(gateway), config);
    let summary = resolver.read_summary(batch_id).await?;
    let actual = summary.batch.current_status;
    if actual != expected {
        warn!(
            batch_id = %batch_id,
            %actual,
            %expected,
            "Rejecting step for batch in wrong status"
        );
        return Err(FlowError::InvalidStatus {
            batch_id: batch_id.clone(),
            expected,
            actual,
        }
        .into());
    }
    Ok(summary)
}

/// Producer: legt eine neue Charge an.
///
/// Die Lieferdaten werden mit dem öffentlichen Schlüssel des Carriers versiegelt,
/// bevor sie die Funktion verlassen.
pub async fn create_order<G: LedgerGateway + ?Sized>(
    gateway: &G,
    identity: &ActiveIdentity,
    config: &ClientConfig,
    request: &CreateOrderRequest,
) -> Result<TransactionDigest, MedTrackError> {
    validate_medicine_code(&request.medicine_code)?;
    validate_company_name(&request.producer_name)?;
    validate_receiver_company(&request.receiver_company, None)?;
    validate_address(&request.delivery.address)?;
    validate_phone_number(&request.delivery.phone)?;

    let encrypted_info =
        confidential_fields::seal_delivery_info(&request.carrier_public_key, &request.delivery)?;

    let call = TransactionCall::CreateRecord {
        medicine_code: request.medicine_code.trim().to_string(),
        producer_name: request.producer_name.trim().to_string(),
        receiver_company: request.receiver_company.trim().to_string(),
        encrypted_info,
    };
    submit(gateway, identity, config, call).await
}

/// Carrier: liest den versiegelten Umschlag einer Charge und öffnet ihn.
///
/// # Returns
/// Den exakt vom Producer verschlüsselten JSON-String mit Adresse und Telefon.
pub async fn reveal_delivery_info<G: LedgerGateway + ?Sized>(
    gateway: &Arc<G>,
    config: &ClientConfig,
    batch_id: &str,
    carrier_secret_key: &str,
) -> Result<String, MedTrackError> {
    let batch_id = validate_batch_id(batch_id)?;
    let resolver = BatchStatusResolver::with_config(Arc::clone(gateway), config);
    let summary = resolver.read_summary(&batch_id).await?;
    let envelope = summary
        .encrypted_info
        .ok_or_else(|| FlowError::MissingEnvelope(batch_id.clone()))?;
    let plaintext = confidential_fields::open_delivery_envelope(&envelope, carrier_secret_key)?;
    debug!(batch_id = %batch_id, "Opened delivery envelope");
    Ok(plaintext)
}

/// Carrier: übernimmt eine Charge im Status `Created`.
pub async fn update_shipping<G: LedgerGateway + ?Sized>(
    gateway: &Arc<G>,
    identity: &ActiveIdentity,
    config: &ClientConfig,
    update: &ShippingUpdate,
) -> Result<TransactionDigest, MedTrackError> {
    let batch_id = validate_batch_id(&update.batch_id)?;
    validate_company_name(&update.carrier_name)?;
    let carrier_phone = validate_phone_number(&update.carrier_phone)?;
    validate_address(&update.location)?;

    read_batch_with_status(gateway, config, &batch_id, BatchStatus::Created).await?;

    let call = TransactionCall::UpdateRecordShipping {
        batch_id,
        carrier_name: update.carrier_name.trim().to_string(),
        carrier_phone,
        location: update.location.trim().to_string(),
        clock: config.clock_object()?,
    };
    submit(gateway.as_ref(), identity, config, call).await
}

/// Pharmacy: bestätigt den Empfang einer Charge im Status `Shipping`.
pub async fn confirm_delivery<G: LedgerGateway + ?Sized>(
    gateway: &Arc<G>,
    identity: &ActiveIdentity,
    config: &ClientConfig,
    confirmation: &DeliveryConfirmation,
) -> Result<TransactionDigest, MedTrackError> {
    let batch_id = validate_batch_id(&confirmation.batch_id)?;
    validate_company_name(&confirmation.pharmacy_name)?;
    let pharmacy_phone = validate_phone_number(&confirmation.pharmacy_phone)?;

    let summary =
        read_batch_with_status(gateway, config, &batch_id, BatchStatus::Shipping).await?;
    if let Some(company) = &confirmation.receiver_company {
        validate_receiver_company(company, summary.receiver_company.as_deref())?;
    }

    let call = TransactionCall::CompleteRecordDelivery {
        batch_id,
        pharmacy_name: confirmation.pharmacy_name.trim().to_string(),
        pharmacy_phone,
        location: String::new(),
        clock: config.clock_object()?,
    };
    submit(gateway.as_ref(), identity, config, call).await
}

/// Wartet mit Backoff auf die Effekte einer übermittelten Transaktion.
///
/// Liefert `ResolutionPending`, wenn die Effekte nach `policy.max_attempts` Abfragen
/// noch nicht sichtbar sind. Es wird niemals eine Ersatz-ID erzeugt.
pub async fn await_confirmation<G: LedgerGateway + ?Sized>(
    gateway: &G,
    config: &ClientConfig,
    digest: &TransactionDigest,
    policy: &RetryPolicy,
) -> Result<Confirmation, MedTrackError> {
    let mut attempt = 0;
    while policy.has_attempts_left(attempt) {
        attempt += 1;
        match gateway.transaction_effects(digest).await {
            Ok(Some(effects)) if effects.is_success() => {
                let created_batch = effects.created_of_type(&config.batch_type_name).cloned();
                info!(%digest, attempt, "Transaction confirmed");
                return Ok(Confirmation::Confirmed {
                    effects,
                    created_batch,
                });
            }
            Ok(Some(effects)) => {
                let error = effects
                    .status
                    .error
                    .unwrap_or_else(|| "unknown error".to_string());
                warn!(%digest, %error, "Transaction failed on ledger");
                return Err(FlowError::TransactionFailed {
                    digest: digest.clone(),
                    error,
                }
                .into());
            }
            Ok(None) => debug!(%digest, attempt, "Effects not yet visible"),
            Err(e) if e.is_transient() => {
                warn!(%digest, attempt, error = %e, "Transient error while reading effects")
            }
            Err(e) => return Err(e.into()),
        }
        if policy.has_attempts_left(attempt) {
            tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
        }
    }
    warn!(%digest, attempts = attempt, "Effects still pending after last attempt");
    Ok(Confirmation::ResolutionPending {
        digest: digest.clone(),
    })
}
