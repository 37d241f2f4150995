//! Business logic use cases
//!
//! A flow step is a use case of its own only when it needs the user (or the
//! host) to decide something before the next one can run.

pub mod import_configured_gateways;
pub mod list_config_entries;
pub mod pairing_flow;

pub use import_configured_gateways::{ImportConfiguredGateways, ImportedFlow};
pub use list_config_entries::ListConfigEntries;
pub use pairing_flow::{FlowContext, FlowError, PairingFlowController, StepRequest};
