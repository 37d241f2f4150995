use thiserror::Error;

use crate::ids::{FlowId, GatewayId};

#[derive(Debug, Error)]
pub enum EntryStoreError {
    #[error("gateway already configured: {0}")]
    AlreadyConfigured(GatewayId),

    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum FlowRegistryError {
    #[error("flow {flow_id} already in progress for {unique_id}")]
    AlreadyInProgress { flow_id: FlowId, unique_id: GatewayId },

    #[error("registry error: {0}")]
    Registry(String),
}
