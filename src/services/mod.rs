pub mod crypto_utils;
pub mod utils;
pub mod record_codec;
pub mod confidential_fields;
pub mod field_access;
pub mod status_resolver;
pub mod batch_watcher;
pub mod input_validation;
pub mod order_flows;
