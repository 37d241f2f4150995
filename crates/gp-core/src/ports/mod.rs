//! Port interfaces for the application layer
//!
//! Ports define the contract between the pairing flow (use cases) and the
//! collaborators it does not own: the gateway discovery library, the host's
//! config-entry store and the host's flow registry. Infrastructure crates
//! implement them; tests fake them.

mod discovery;
mod entry_store;
pub mod errors;
mod flow_registry;

pub use discovery::{DiscoveryOptions, GatewayDiscoveryPort};
pub use entry_store::ConfigEntryStorePort;
pub use errors::{EntryStoreError, FlowRegistryError};
pub use flow_registry::FlowRegistryPort;
