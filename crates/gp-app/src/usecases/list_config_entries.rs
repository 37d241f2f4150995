use std::sync::Arc;

use anyhow::Result;
use gp_core::ports::ConfigEntryStorePort;
use gp_core::ConfigEntry;

/// Lists the config entries already created for the integration's domain.
pub struct ListConfigEntries {
    entry_store: Arc<dyn ConfigEntryStorePort>,
    domain: String,
}

impl ListConfigEntries {
    pub fn new(entry_store: Arc<dyn ConfigEntryStorePort>, domain: impl Into<String>) -> Self {
        Self {
            entry_store,
            domain: domain.into(),
        }
    }

    pub async fn execute(&self) -> Result<Vec<ConfigEntry>> {
        let entries = self
            .entry_store
            .list_entries()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list config entries: {}", e))?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.domain == self.domain)
            .collect())
    }
}
