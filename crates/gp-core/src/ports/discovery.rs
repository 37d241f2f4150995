use anyhow::Result;
use async_trait::async_trait;

use crate::gateway::{GatewayDescriptor, ANY_INTERFACE};

/// Parameters handed to the discovery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Network interface to scan on, `"any"` for all.
    pub interface: String,
    /// Retry count the discovered gateways should be configured with.
    pub retries: u32,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            interface: ANY_INTERFACE.to_string(),
            retries: 5,
        }
    }
}

/// Discovery port enumerating gateways reachable on the local network.
#[async_trait]
pub trait GatewayDiscoveryPort: Send + Sync {
    /// Run one discovery pass. An empty list is a valid answer.
    async fn discover(&self, options: &DiscoveryOptions) -> Result<Vec<GatewayDescriptor>>;
}
