//! Pairing flow use cases.
//!
//! This module exposes the pairing flow controller and its per-flow context.

mod context;
pub mod orchestrator;

pub use context::FlowContext;
pub use orchestrator::{FlowError, PairingFlowController, StepRequest};
