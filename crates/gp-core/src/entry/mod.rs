//! Config entry domain models.
//!
//! A [`ConfigRecord`] is the pairing result; a [`ConfigEntry`] is the
//! envelope the host's entry store keeps around it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::GatewayDescriptor;
use crate::ids::{EntryId, GatewayId};

/// Schema version of entries written by this flow.
pub const ENTRY_VERSION: u32 = 1;

/// Persisted pairing result.
///
/// Field names on the wire follow the keys the host integration has always
/// read (`ip`, `sid`, `discovery_retries`, `interface`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    #[serde(rename = "ip")]
    pub address: String,
    pub port: u16,
    #[serde(rename = "sid")]
    pub id: GatewayId,
    pub key: String,
    #[serde(rename = "discovery_retries")]
    pub discovery_retry_count: u32,
    #[serde(rename = "interface")]
    pub network_interface: String,
}

impl ConfigRecord {
    /// Build the record for a bound gateway and the key the user submitted.
    pub fn from_gateway(gateway: &GatewayDescriptor, key: impl Into<String>) -> Self {
        Self {
            address: gateway.address.clone(),
            port: gateway.port,
            id: gateway.id.clone(),
            key: key.into(),
            discovery_retry_count: gateway.discovery_retry_count,
            network_interface: gateway.network_interface.clone(),
        }
    }
}

/// How the flow that produced an entry was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    User,
    Import,
}

/// A config entry as stored by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: EntryId,
    pub domain: String,
    pub title: String,
    pub version: u32,
    pub source: EntrySource,
    pub unique_id: Option<GatewayId>,
    pub data: ConfigRecord,
    pub created_at: DateTime<Utc>,
}

impl ConfigEntry {
    pub fn new(
        domain: impl Into<String>,
        title: impl Into<String>,
        source: EntrySource,
        data: ConfigRecord,
    ) -> Self {
        Self {
            entry_id: EntryId::new(),
            domain: domain.into(),
            title: title.into(),
            version: ENTRY_VERSION,
            source,
            unique_id: Some(data.id.clone()),
            data,
            created_at: Utc::now(),
        }
    }

    /// Gateway id this entry configures.
    pub fn gateway_id(&self) -> &GatewayId {
        &self.data.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fixtures::gateway;

    #[test]
    fn record_uses_submitted_key_not_discovered_one() {
        let mut gw = gateway("0123456789abcdef", "192.168.1.100");
        gw.key = Some("from-discovery".into());

        let record = ConfigRecord::from_gateway(&gw, "abc");

        assert_eq!(record.key, "abc");
        assert_eq!(record.id, gw.id);
        assert_eq!(record.address, "192.168.1.100");
        assert_eq!(record.port, gw.port);
    }

    #[test]
    fn record_serializes_with_host_keys() {
        let record = ConfigRecord::from_gateway(&gateway("aa", "10.0.0.1"), "k");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["ip"], "10.0.0.1");
        assert_eq!(value["sid"], "aa");
        assert_eq!(value["key"], "k");
        assert_eq!(value["discovery_retries"], 3);
        assert_eq!(value["interface"], "any");
        assert!(value.get("address").is_none());
    }

    #[test]
    fn new_entry_takes_unique_id_from_record() {
        let record = ConfigRecord::from_gateway(&gateway("aa", "10.0.0.1"), "k");
        let entry = ConfigEntry::new("xiaomi_aqara", "Xiaomi Aqara", EntrySource::User, record);

        assert_eq!(entry.unique_id, Some(GatewayId::from("aa")));
        assert_eq!(entry.gateway_id(), &GatewayId::from("aa"));
        assert_eq!(entry.version, ENTRY_VERSION);
    }
}
