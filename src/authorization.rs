//! # src/authorization.rs
//!
//! Optionale Zugriffsprüfung vor schreibenden Abläufen. Die Anwendung entscheidet, ob
//! und welche Konten Transaktionen auslösen dürfen; das Lesen bleibt uneingeschränkt.

use crate::config::{ClientConfig, ConfigError};
use crate::models::identifier::Address;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Wallet {0} is not authorized for this operation.")]
    NotAllowed(Address),
}

/// Eine austauschbare Zugriffsregel.
pub trait AccessPolicy: Send + Sync {
    fn authorize(&self, address: &Address) -> Result<(), AuthorizationError>;
}

/// Erlaubt jedem Konto den Zugriff.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn authorize(&self, _address: &Address) -> Result<(), AuthorizationError> {
        Ok(())
    }
}

/// Erlaubt nur die aufgeführten Konten.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    allowed: HashSet<Address>,
}

impl AllowList {
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            allowed: addresses.into_iter().collect(),
        }
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.allowed.contains(address)
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl AccessPolicy for AllowList {
    fn authorize(&self, address: &Address) -> Result<(), AuthorizationError> {
        if self.contains(address) {
            Ok(())
        } else {
            Err(AuthorizationError::NotAllowed(address.clone()))
        }
    }
}

/// Baut die Regel aus `allowed_wallets`; eine leere Liste bedeutet `AllowAll`.
pub fn policy_from_config(config: &ClientConfig) -> Result<Box<dyn AccessPolicy>, ConfigError> {
    let addresses = config.allowed_addresses()?;
    if addresses.is_empty() {
        Ok(Box::new(AllowAll))
    } else {
        Ok(Box::new(AllowList::new(addresses)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_rejects_unknown_wallets() {
        let member = Address::parse(&"a".repeat(64)).unwrap();
        let stranger = Address::parse(&"b".repeat(64)).unwrap();
        let list = AllowList::new([member.clone()]);
        assert_eq!(list.authorize(&member), Ok(()));
        assert_eq!(
            list.authorize(&stranger),
            Err(AuthorizationError::NotAllowed(stranger.clone()))
        );
        assert_eq!(AllowAll.authorize(&stranger), Ok(()));
    }

    #[test]
    fn empty_config_list_allows_everyone() {
        let policy = policy_from_config(&ClientConfig::default()).unwrap();
        let anyone = Address::parse(&"c".repeat(64)).unwrap();
        assert!(policy.authorize(&anyone).is_ok());

        let config = ClientConfig {
            allowed_wallets: vec![format!("0x{}", "d".repeat(64))],
            ..ClientConfig::default()
        };
        let policy = policy_from_config(&config).unwrap();
        assert!(policy.authorize(&anyone).is_err());
    }
}
