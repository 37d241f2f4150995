//! Pairing flow domain module.
//!
//! This module defines the pairing wizard state machine, its form contract
//! and the results handed back to the host flow engine.

pub mod form;
pub mod result;
pub mod state_machine;

pub use form::{ChoiceOption, FieldKind, FormField, FormInput, FormInputError, FormSchema};
pub use result::{AbortReason, FlowResult, StepId};
pub use state_machine::{FlowAction, FlowEvent, FlowState, PairingFlowStateMachine};
