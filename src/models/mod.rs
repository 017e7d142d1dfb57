pub mod batch;
pub mod envelope;
pub mod identifier;
pub mod identity;
pub mod ledger_object;
pub mod transaction;
