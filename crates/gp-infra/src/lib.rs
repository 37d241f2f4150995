//! Adapters implementing the `gp-core` ports.

pub mod discovery;
pub mod entry_store;
pub mod flow_registry;

pub use discovery::StaticGatewayDiscovery;
pub use entry_store::{FileConfigEntryStore, InMemoryConfigEntryStore};
pub use flow_registry::InMemoryFlowRegistry;
