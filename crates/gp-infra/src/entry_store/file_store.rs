//! File-based config entry store
//!
//! This module provides a file-based implementation of the ConfigEntryStorePort,
//! persisting all entries as one JSON array in the application data directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gp_core::ports::{ConfigEntryStorePort, EntryStoreError};
use gp_core::ConfigEntry;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_ENTRIES_FILE: &str = "entries.json";

pub struct FileConfigEntryStore {
    entries_file_path: PathBuf,
    /// Readers share; `create_entry` holds it exclusively for its
    /// read-modify-write cycle.
    lock: RwLock<()>,
}

impl FileConfigEntryStore {
    /// Create store with custom file path
    pub fn new(entries_file_path: PathBuf) -> Self {
        Self {
            entries_file_path,
            lock: RwLock::new(()),
        }
    }

    /// Create store with defaults
    pub fn with_defaults(base_dir: PathBuf) -> Self {
        Self::new(base_dir.join(DEFAULT_ENTRIES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.entries_file_path
    }

    async fn ensure_parent_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.entries_file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn read_entries(&self) -> anyhow::Result<Vec<ConfigEntry>> {
        if !fs::try_exists(&self.entries_file_path).await? {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.entries_file_path).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<ConfigEntry> = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config entries: {e}"))?;

        Ok(entries)
    }

    async fn write_entries(&self, entries: &[ConfigEntry]) -> anyhow::Result<()> {
        self.ensure_parent_dir().await?;

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config entries: {e}"))?;

        // Readers only ever see the previous or the new complete file.
        let tmp_path = self.entries_file_path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create temp entries file: {e}"))?;

        file.write_all(json.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write temp entries file: {e}"))?;

        file.sync_all()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to sync temp entries file: {e}"))?;
        drop(file);

        fs::rename(&tmp_path, &self.entries_file_path)
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to rename {} -> {}: {e}",
                    tmp_path.display(),
                    self.entries_file_path.display()
                )
            })?;

        Ok(())
    }
}

fn storage_error(err: anyhow::Error) -> EntryStoreError {
    EntryStoreError::Storage(err.to_string())
}

#[async_trait]
impl ConfigEntryStorePort for FileConfigEntryStore {
    async fn list_entries(&self) -> Result<Vec<ConfigEntry>, EntryStoreError> {
        let _guard = self.lock.read().await;
        self.read_entries().await.map_err(storage_error)
    }

    async fn create_entry(&self, entry: ConfigEntry) -> Result<(), EntryStoreError> {
        let _guard = self.lock.write().await;

        let mut entries = self.read_entries().await.map_err(storage_error)?;
        if entries
            .iter()
            .any(|existing| existing.gateway_id() == entry.gateway_id())
        {
            return Err(EntryStoreError::AlreadyConfigured(entry.gateway_id().clone()));
        }

        debug!(
            entry_id = %entry.entry_id,
            gateway_id = %entry.gateway_id(),
            path = %self.entries_file_path.display(),
            "persisting config entry"
        );
        entries.push(entry);
        self.write_entries(&entries).await.map_err(storage_error)
    }
}
