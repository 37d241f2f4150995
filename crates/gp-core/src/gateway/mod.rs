//! Gateway domain models.
//!
//! A [`GatewayDescriptor`] is what the discovery collaborator reports for a
//! gateway on the local network. It is transient: the pairing flow holds it
//! only until the config entry is created or the flow is abandoned.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ids::GatewayId;

/// Network interface used when nothing more specific is configured.
pub const ANY_INTERFACE: &str = "any";

/// A gateway reported by discovery (or supplied by static configuration).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayDescriptor {
    pub id: GatewayId,
    pub address: String,
    pub port: u16,
    /// Pairing secret, when discovery (or configuration) already knows it.
    #[serde(default)]
    pub key: Option<String>,
    pub discovery_retry_count: u32,
    pub network_interface: String,
    #[serde(default)]
    pub proto_version: Option<String>,
}

/// One option of the gateway choice form: value is the id, label the address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayChoice {
    pub id: GatewayId,
    pub address: String,
}

impl From<&GatewayDescriptor> for GatewayChoice {
    fn from(gateway: &GatewayDescriptor) -> Self {
        Self {
            id: gateway.id.clone(),
            address: gateway.address.clone(),
        }
    }
}

/// Gateways discovered during one flow invocation, keyed by id.
///
/// 本次流程发现的网关集合（按 id 索引）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredGateways {
    gateways: BTreeMap<GatewayId, GatewayDescriptor>,
}

impl DiscoveredGateways {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    pub fn contains(&self, id: &GatewayId) -> bool {
        self.gateways.contains_key(id)
    }

    pub fn get(&self, id: &GatewayId) -> Option<&GatewayDescriptor> {
        self.gateways.get(id)
    }

    /// Take ownership of the descriptor with the given id.
    pub fn take(mut self, id: &GatewayId) -> Option<GatewayDescriptor> {
        self.gateways.remove(id)
    }

    /// Drop every gateway whose id is already configured.
    pub fn without_configured(self, configured: &HashSet<GatewayId>) -> Self {
        Self {
            gateways: self
                .gateways
                .into_iter()
                .filter(|(id, _)| !configured.contains(id))
                .collect(),
        }
    }

    /// Returns the only gateway of the set, if the set has exactly one.
    pub fn into_single(self) -> Result<GatewayDescriptor, Self> {
        if self.gateways.len() != 1 {
            return Err(self);
        }
        let mut gateways = self.gateways;
        match gateways.pop_first() {
            Some((_, gateway)) => Ok(gateway),
            None => Err(Self { gateways }),
        }
    }

    pub fn choices(&self) -> Vec<GatewayChoice> {
        self.gateways.values().map(GatewayChoice::from).collect()
    }
}

impl FromIterator<GatewayDescriptor> for DiscoveredGateways {
    /// Later descriptors with a repeated id replace earlier ones.
    fn from_iter<I: IntoIterator<Item = GatewayDescriptor>>(iter: I) -> Self {
        Self {
            gateways: iter
                .into_iter()
                .map(|gateway| (gateway.id.clone(), gateway))
                .collect(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::gateway;
    use super::*;

    #[test]
    fn without_configured_drops_known_ids() {
        let set: DiscoveredGateways = vec![
            gateway("aa", "192.168.1.10"),
            gateway("bb", "192.168.1.11"),
        ]
        .into_iter()
        .collect();
        let configured: HashSet<GatewayId> = [GatewayId::from("aa")].into_iter().collect();

        let remaining = set.without_configured(&configured);

        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains(&GatewayId::from("bb")));
    }

    #[test]
    fn into_single_only_succeeds_for_exactly_one() {
        let one: DiscoveredGateways = vec![gateway("aa", "10.0.0.1")].into_iter().collect();
        assert_eq!(one.into_single().unwrap().id, GatewayId::from("aa"));

        let two: DiscoveredGateways = vec![gateway("aa", "10.0.0.1"), gateway("bb", "10.0.0.2")]
            .into_iter()
            .collect();
        let back = two.into_single().unwrap_err();
        assert_eq!(back.len(), 2);

        assert!(DiscoveredGateways::new().into_single().is_err());
    }

    #[test]
    fn duplicate_ids_collapse_to_last_seen() {
        let set: DiscoveredGateways = vec![gateway("aa", "10.0.0.1"), gateway("aa", "10.0.0.9")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&GatewayId::from("aa")).unwrap().address, "10.0.0.9");
    }

    #[test]
    fn choices_label_each_gateway_with_its_address() {
        let set: DiscoveredGateways = vec![gateway("bb", "10.0.0.2"), gateway("aa", "10.0.0.1")]
            .into_iter()
            .collect();
        let choices = set.choices();
        assert_eq!(
            choices,
            vec![
                GatewayChoice {
                    id: GatewayId::from("aa"),
                    address: "10.0.0.1".into()
                },
                GatewayChoice {
                    id: GatewayId::from("bb"),
                    address: "10.0.0.2".into()
                },
            ]
        );
    }
}
