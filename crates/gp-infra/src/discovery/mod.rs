//! Gateway discovery adapters.

mod static_discovery;

pub use static_discovery::StaticGatewayDiscovery;
