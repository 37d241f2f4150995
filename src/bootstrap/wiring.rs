//! # Dependency Injection / 依赖注入模块
//!
//! Creates the infra adapters and hands them to the pairing flow controller
//! as ports. Assembly only; flow decisions stay in `gp-app`.

use std::path::PathBuf;
use std::sync::Arc;

use gp_app::PairingFlowController;
use gp_core::ports::{ConfigEntryStorePort, GatewayDiscoveryPort};
use gp_core::PairingConfig;
use gp_infra::entry_store::DEFAULT_ENTRIES_FILE;
use gp_infra::{FileConfigEntryStore, InMemoryFlowRegistry, StaticGatewayDiscovery};
use tracing::info;

const APP_DIR_NAME: &str = "gatewaypair";

pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency injection
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("No local data directory available to store config entries")]
    DataDirUnavailable,
}

/// Wired dependencies of one pairing process.
pub struct PairingDeps {
    pub config: Arc<PairingConfig>,
    pub controller: Arc<PairingFlowController>,
    pub entry_store: Arc<dyn ConfigEntryStorePort>,
    pub flow_registry: Arc<InMemoryFlowRegistry>,
}

/// Where the entry file lives: `[storage].entries_path`, or the platform
/// data-local dir when that is empty.
pub fn resolve_entries_path(config: &PairingConfig) -> WiringResult<PathBuf> {
    if !config.storage.entries_path.as_os_str().is_empty() {
        return Ok(config.storage.entries_path.clone());
    }
    let data_dir = dirs::data_local_dir().ok_or(WiringError::DataDirUnavailable)?;
    Ok(data_dir.join(APP_DIR_NAME).join(DEFAULT_ENTRIES_FILE))
}

/// Wire the default adapters. Discovery answers with the statically
/// declared gateways.
pub fn wire_dependencies(config: PairingConfig) -> WiringResult<PairingDeps> {
    let discovery = Arc::new(StaticGatewayDiscovery::new(config.static_gateways()));
    wire_with_discovery(config, discovery)
}

/// Wire with a caller-supplied discovery adapter.
pub fn wire_with_discovery(
    config: PairingConfig,
    discovery: Arc<dyn GatewayDiscoveryPort>,
) -> WiringResult<PairingDeps> {
    let entries_path = resolve_entries_path(&config)?;
    info!(path = %entries_path.display(), "config entry store");

    let config = Arc::new(config);
    let entry_store: Arc<dyn ConfigEntryStorePort> =
        Arc::new(FileConfigEntryStore::new(entries_path));
    let flow_registry = Arc::new(InMemoryFlowRegistry::new());

    let controller = Arc::new(PairingFlowController::new(
        config.clone(),
        discovery,
        entry_store.clone(),
        flow_registry.clone(),
    ));

    Ok(PairingDeps {
        config,
        controller,
        entry_store,
        flow_registry,
    })
}
