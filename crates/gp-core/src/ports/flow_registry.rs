use async_trait::async_trait;

use crate::ids::{FlowId, GatewayId};

use super::errors::FlowRegistryError;

/// Registry of flows in progress, keyed by the unique id they claimed.
#[async_trait]
pub trait FlowRegistryPort: Send + Sync {
    /// Claim `unique_id` for `flow_id`, replacing any earlier claim of that
    /// flow.
    ///
    /// With `raise_on_progress` set, fails with
    /// [`FlowRegistryError::AlreadyInProgress`] when another flow holds the
    /// same id; otherwise both flows keep going.
    async fn set_unique_id(
        &self,
        flow_id: &FlowId,
        unique_id: &GatewayId,
        raise_on_progress: bool,
    ) -> Result<(), FlowRegistryError>;

    /// Forget whatever `flow_id` claimed.
    async fn release(&self, flow_id: &FlowId) -> Result<(), FlowRegistryError>;

    /// Flows currently holding `unique_id`.
    async fn flows_for(&self, unique_id: &GatewayId) -> Result<Vec<FlowId>, FlowRegistryError>;
}
