use std::collections::HashSet;

use async_trait::async_trait;

use crate::entry::ConfigEntry;
use crate::ids::GatewayId;

use super::errors::EntryStoreError;

/// The host's config-entry store.
#[async_trait]
pub trait ConfigEntryStorePort: Send + Sync {
    async fn list_entries(&self) -> Result<Vec<ConfigEntry>, EntryStoreError>;

    /// Persist a new entry.
    ///
    /// Must fail with [`EntryStoreError::AlreadyConfigured`] when an entry for
    /// the same gateway id exists.
    async fn create_entry(&self, entry: ConfigEntry) -> Result<(), EntryStoreError>;

    /// Gateway ids that already have an entry.
    async fn configured_gateway_ids(&self) -> Result<HashSet<GatewayId>, EntryStoreError> {
        Ok(self
            .list_entries()
            .await?
            .into_iter()
            .map(|entry| entry.data.id)
            .collect())
    }
}
