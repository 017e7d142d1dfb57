//! # src/app_service/mod.rs
//!
//! Definiert den `MedTrackService`, eine Fassade über Ledger, Identität, Konfiguration
//! und Zugriffsregel, um die Kernlogik für Client-Anwendungen zu vereinfachen.
//!
//! Der Service kann ohne Identität betrieben werden (`Locked`): dann sind nur lesende
//! Abfragen möglich. Nach `unlock` (`Unlocked`) stehen die schreibenden Abläufe der
//! Rollen zur Verfügung; vor jedem wird die Zugriffsregel geprüft.

use crate::authorization::{policy_from_config, AccessPolicy};
use crate::config::ClientConfig;
use crate::error::MedTrackError;
use crate::ledger::LedgerGateway;
use crate::models::identifier::Address;
use crate::models::identity::ActiveIdentity;
use crate::services::order_flows::FlowError;
use crate::services::status_resolver::BatchStatusResolver;
use std::sync::Arc;

mod command_handler;
mod queries;

/// Repräsentiert den Kernzustand der Anwendung.
pub enum AppState {
    /// Keine Identität geladen; nur Abfragen.
    Locked,
    /// Eine Identität ist geladen und darf Transaktionen signieren.
    Unlocked { identity: ActiveIdentity },
}

/// Die `MedTrackService`-Fassade.
pub struct MedTrackService {
    gateway: Arc<dyn LedgerGateway>,
    config: ClientConfig,
    policy: Box<dyn AccessPolicy>,
    state: AppState,
}

impl MedTrackService {
    /// Initialisiert einen neuen Service im Zustand `Locked`.
    ///
    /// Die Zugriffsregel wird aus `config.allowed_wallets` gebaut.
    ///
    /// # Errors
    /// Schlägt fehl, wenn die Konfiguration ungültig ist.
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        config: ClientConfig,
    ) -> Result<Self, MedTrackError> {
        config.validate()?;
        let policy = policy_from_config(&config)?;
        Ok(Self {
            gateway,
            config,
            policy,
            state: AppState::Locked,
        })
    }

    /// Ersetzt die Zugriffsregel, z.B. durch eine anwendungsspezifische Prüfung.
    pub fn with_policy(mut self, policy: Box<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Lädt eine Identität und versetzt den Service in den Zustand `Unlocked`.
    pub fn unlock(&mut self, identity: ActiveIdentity) {
        self.state = AppState::Unlocked { identity };
    }

    /// Verwirft die Identität (inkl. privatem Schlüssel).
    pub fn lock(&mut self) {
        self.state = AppState::Locked;
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, AppState::Unlocked { .. })
    }

    pub fn active_address(&self) -> Option<&Address> {
        match &self.state {
            AppState::Unlocked { identity } => Some(&identity.address),
            AppState::Locked => None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn resolver(&self) -> BatchStatusResolver<dyn LedgerGateway> {
        BatchStatusResolver::with_config(Arc::clone(&self.gateway), &self.config)
    }

    /// Liefert die Identität, falls der Service entsperrt ist und die Zugriffsregel sie zulässt.
    fn authorized_identity(&self) -> Result<&ActiveIdentity, MedTrackError> {
        match &self.state {
            AppState::Unlocked { identity } => {
                self.policy.authorize(&identity.address)?;
                Ok(identity)
            }
            AppState::Locked => Err(FlowError::Locked.into()),
        }
    }
}
