//! Pairing configuration domain model
//!
//! Plain data mapped from the TOML configuration file. Missing sections and
//! keys fall back to the values the integration has always used.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::gateway::{GatewayDescriptor, ANY_INTERFACE};
use crate::ids::GatewayId;
use crate::ports::DiscoveryOptions;

pub const DEFAULT_DOMAIN: &str = "xiaomi_aqara";
pub const DEFAULT_ENTRY_TITLE: &str = "Xiaomi Aqara";
pub const DEFAULT_DISCOVERY_RETRIES: u32 = 5;
pub const DEFAULT_GATEWAY_PORT: u16 = 9898;

/// Pairing configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingConfig {
    #[serde(default)]
    pub flow: FlowConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Gateways declared statically; imported at startup.
    #[serde(default)]
    pub gateways: Vec<StaticGatewayConfig>,
}

impl PairingConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            interface: self.discovery.interface.clone(),
            retries: self.discovery.retries,
        }
    }

    /// Statically declared gateways as descriptors ready for import.
    pub fn static_gateways(&self) -> Vec<GatewayDescriptor> {
        self.gateways
            .iter()
            .map(|gateway| gateway.to_descriptor(&self.discovery))
            .collect()
    }
}

/// Flow presentation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Title given to created entries
    #[serde(default = "default_entry_title")]
    pub entry_title: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            entry_title: default_entry_title(),
        }
    }
}

/// Discovery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_interface")]
    pub interface: String,

    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            retries: default_retries(),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Entry file path; empty means "use the platform data dir".
    #[serde(default)]
    pub entries_path: PathBuf,
}

/// A gateway declared in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticGatewayConfig {
    pub id: String,
    pub address: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,

    #[serde(default)]
    pub key: Option<String>,

    /// Overrides `[discovery].interface` for this gateway
    #[serde(default)]
    pub interface: Option<String>,
}

impl StaticGatewayConfig {
    pub fn to_descriptor(&self, discovery: &DiscoveryConfig) -> GatewayDescriptor {
        GatewayDescriptor {
            id: GatewayId::new(self.id.clone()),
            address: self.address.clone(),
            port: self.port,
            key: self.key.clone(),
            discovery_retry_count: discovery.retries,
            network_interface: self
                .interface
                .clone()
                .unwrap_or_else(|| discovery.interface.clone()),
            proto_version: None,
        }
    }
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_entry_title() -> String {
    DEFAULT_ENTRY_TITLE.to_string()
}

fn default_interface() -> String {
    ANY_INTERFACE.to_string()
}

fn default_retries() -> u32 {
    DEFAULT_DISCOVERY_RETRIES
}

fn default_gateway_port() -> u16 {
    DEFAULT_GATEWAY_PORT
}
