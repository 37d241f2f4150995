//! # gatewaypair
//!
//! Process bootstrap for the gateway pairing flow: configuration loading,
//! tracing initialization and wiring of the infra adapters into the
//! `gp-app` use cases.

pub mod bootstrap;

pub use bootstrap::{init_tracing_subscriber, load_config, wire_dependencies, PairingDeps};
