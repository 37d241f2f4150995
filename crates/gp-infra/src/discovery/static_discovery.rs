//! Discovery backed by a fixed gateway list.
//!
//! Stands in for the vendor discovery library where gateways are declared
//! up front (configuration file, tests). Interface filtering and retry count
//! follow the options the flow passes in.

use anyhow::Result;
use async_trait::async_trait;
use gp_core::gateway::{GatewayDescriptor, ANY_INTERFACE};
use gp_core::ports::{DiscoveryOptions, GatewayDiscoveryPort};
use tracing::debug;

pub struct StaticGatewayDiscovery {
    gateways: Vec<GatewayDescriptor>,
}

impl StaticGatewayDiscovery {
    pub fn new(gateways: Vec<GatewayDescriptor>) -> Self {
        Self { gateways }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl GatewayDiscoveryPort for StaticGatewayDiscovery {
    async fn discover(&self, options: &DiscoveryOptions) -> Result<Vec<GatewayDescriptor>> {
        let gateways: Vec<GatewayDescriptor> = self
            .gateways
            .iter()
            .filter(|gateway| {
                options.interface == ANY_INTERFACE
                    || gateway.network_interface == ANY_INTERFACE
                    || gateway.network_interface == options.interface
            })
            .cloned()
            .map(|mut gateway| {
                gateway.discovery_retry_count = options.retries;
                gateway
            })
            .collect();

        debug!(
            interface = %options.interface,
            found = gateways.len(),
            "static gateway discovery finished"
        );
        Ok(gateways)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gp_core::GatewayId;

    fn gateway(id: &str, interface: &str) -> GatewayDescriptor {
        GatewayDescriptor {
            id: GatewayId::from(id),
            address: "192.168.1.100".into(),
            port: 9898,
            key: None,
            discovery_retry_count: 0,
            network_interface: interface.into(),
            proto_version: None,
        }
    }

    #[tokio::test]
    async fn any_interface_returns_every_gateway_with_requested_retries() {
        let discovery = StaticGatewayDiscovery::new(vec![
            gateway("aa", "eth0"),
            gateway("bb", "wlan0"),
        ]);

        let found = discovery
            .discover(&DiscoveryOptions {
                interface: "any".into(),
                retries: 7,
            })
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|g| g.discovery_retry_count == 7));
    }

    #[tokio::test]
    async fn specific_interface_filters_other_interfaces() {
        let discovery = StaticGatewayDiscovery::new(vec![
            gateway("aa", "eth0"),
            gateway("bb", "wlan0"),
            gateway("cc", "any"),
        ]);

        let found = discovery
            .discover(&DiscoveryOptions {
                interface: "eth0".into(),
                retries: 5,
            })
            .await
            .unwrap();

        let ids: Vec<_> = found.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["aa", "cc"]);
    }

    #[tokio::test]
    async fn empty_discovery_is_not_an_error() {
        let found = StaticGatewayDiscovery::empty()
            .discover(&DiscoveryOptions::default())
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
