//! gatewaypair application orchestration layer
//!
//! This crate contains the pairing flow use cases. They drive the pure state
//! machine from `gp-core` and execute its actions through ports.

pub mod usecases;

pub use usecases::{
    FlowContext, FlowError, ImportConfiguredGateways, ListConfigEntries, PairingFlowController,
    StepRequest,
};
