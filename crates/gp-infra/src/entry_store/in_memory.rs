use async_trait::async_trait;
use gp_core::ports::{ConfigEntryStorePort, EntryStoreError};
use gp_core::ConfigEntry;
use tokio::sync::RwLock;

/// Entry store kept in memory; used by tests and short-lived hosts.
#[derive(Default)]
pub struct InMemoryConfigEntryStore {
    entries: RwLock<Vec<ConfigEntry>>,
}

impl InMemoryConfigEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<ConfigEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl ConfigEntryStorePort for InMemoryConfigEntryStore {
    async fn list_entries(&self) -> Result<Vec<ConfigEntry>, EntryStoreError> {
        Ok(self.entries.read().await.clone())
    }

    async fn create_entry(&self, entry: ConfigEntry) -> Result<(), EntryStoreError> {
        let mut entries = self.entries.write().await;
        if entries
            .iter()
            .any(|existing| existing.gateway_id() == entry.gateway_id())
        {
            return Err(EntryStoreError::AlreadyConfigured(entry.gateway_id().clone()));
        }
        entries.push(entry);
        Ok(())
    }
}
