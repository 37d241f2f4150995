//! In-memory registry of pairing flows in progress.
//!
//! Each flow holds at most one unique id. Several flows may hold the same id
//! unless the caller asks to raise on progress.

use std::collections::HashMap;

use async_trait::async_trait;
use gp_core::ports::{FlowRegistryError, FlowRegistryPort};
use gp_core::{FlowId, GatewayId};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
pub struct InMemoryFlowRegistry {
    claims: Mutex<HashMap<FlowId, GatewayId>>,
}

impl InMemoryFlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flows currently holding a unique id.
    pub async fn len(&self) -> usize {
        self.claims.lock().await.len()
    }

    pub async fn unique_id_of(&self, flow_id: &FlowId) -> Option<GatewayId> {
        self.claims.lock().await.get(flow_id).cloned()
    }
}

#[async_trait]
impl FlowRegistryPort for InMemoryFlowRegistry {
    async fn set_unique_id(
        &self,
        flow_id: &FlowId,
        unique_id: &GatewayId,
        raise_on_progress: bool,
    ) -> Result<(), FlowRegistryError> {
        let mut claims = self.claims.lock().await;

        let other = claims
            .iter()
            .find(|(id, claimed)| *id != flow_id && *claimed == unique_id)
            .map(|(id, _)| id.clone());

        if let Some(other) = other {
            if raise_on_progress {
                return Err(FlowRegistryError::AlreadyInProgress {
                    flow_id: other,
                    unique_id: unique_id.clone(),
                });
            }
            debug!(
                flow_id = %flow_id,
                other_flow_id = %other,
                unique_id = %unique_id,
                "unique id already claimed by another flow"
            );
        }

        claims.insert(flow_id.clone(), unique_id.clone());
        Ok(())
    }

    async fn release(&self, flow_id: &FlowId) -> Result<(), FlowRegistryError> {
        self.claims.lock().await.remove(flow_id);
        Ok(())
    }

    async fn flows_for(&self, unique_id: &GatewayId) -> Result<Vec<FlowId>, FlowRegistryError> {
        Ok(self
            .claims
            .lock()
            .await
            .iter()
            .filter(|(_, claimed)| *claimed == unique_id)
            .map(|(flow_id, _)| flow_id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_id_is_shared_when_not_raising() {
        let registry = InMemoryFlowRegistry::new();
        let (a, b) = (FlowId::new(), FlowId::new());
        let gateway = GatewayId::from("aa");

        registry.set_unique_id(&a, &gateway, false).await.unwrap();
        registry.set_unique_id(&b, &gateway, false).await.unwrap();

        let mut flows = registry.flows_for(&gateway).await.unwrap();
        flows.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        let mut expected = vec![a, b];
        expected.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        assert_eq!(flows, expected);
    }

    #[tokio::test]
    async fn raising_reports_the_flow_in_progress() {
        let registry = InMemoryFlowRegistry::new();
        let (a, b) = (FlowId::new(), FlowId::new());
        let gateway = GatewayId::from("aa");

        registry.set_unique_id(&a, &gateway, false).await.unwrap();
        let err = registry.set_unique_id(&b, &gateway, true).await.unwrap_err();

        match err {
            FlowRegistryError::AlreadyInProgress { flow_id, unique_id } => {
                assert_eq!(flow_id, a);
                assert_eq!(unique_id, gateway);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(registry.unique_id_of(&b).await.is_none());
    }

    #[tokio::test]
    async fn reclaiming_replaces_previous_claim_and_release_forgets_it() {
        let registry = InMemoryFlowRegistry::new();
        let flow = FlowId::new();

        registry
            .set_unique_id(&flow, &GatewayId::from("aa"), false)
            .await
            .unwrap();
        registry
            .set_unique_id(&flow, &GatewayId::from("bb"), true)
            .await
            .unwrap();
        assert_eq!(registry.unique_id_of(&flow).await, Some(GatewayId::from("bb")));
        assert_eq!(registry.len().await, 1);

        registry.release(&flow).await.unwrap();
        assert_eq!(registry.len().await, 0);
    }
}
