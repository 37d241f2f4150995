//! # gp-core
//!
//! Core domain models and business logic for gatewaypair.
//!
//! This crate contains pure business logic without any infrastructure dependencies.
//! The pairing flow is expressed as a pure state machine; side effects are
//! described as actions and executed by the application layer through ports.

// Public module exports
pub mod config;
pub mod entry;
pub mod flow;
pub mod gateway;
pub mod ids;
pub mod ports;

// Re-export commonly used types at the crate root
pub use config::PairingConfig;
pub use entry::{ConfigEntry, ConfigRecord, EntrySource};
pub use flow::{AbortReason, FlowResult, FlowState, StepId};
pub use gateway::{DiscoveredGateways, GatewayDescriptor};
pub use ids::{EntryId, FlowId, GatewayId};
