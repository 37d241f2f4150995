//! Import gateways declared in the configuration file.
//!
//! Every declared gateway gets its own import flow. When the declaration
//! already carries the pairing key it is submitted right away; otherwise the
//! flow is handed back waiting on the key form.

use std::sync::Arc;

use gp_core::flow::form::FIELD_KEY;
use gp_core::flow::{FlowResult, FormInput, StepId};
use gp_core::{GatewayDescriptor, GatewayId};
use tracing::{info, info_span, Instrument};

use super::pairing_flow::{FlowContext, FlowError, PairingFlowController};

/// Outcome of importing one declared gateway.
#[derive(Debug)]
pub struct ImportedFlow {
    pub gateway_id: GatewayId,
    pub result: FlowResult,
    /// Still-running flow (key form pending); `None` once finished.
    pub context: Option<FlowContext>,
}

pub struct ImportConfiguredGateways {
    controller: Arc<PairingFlowController>,
}

impl ImportConfiguredGateways {
    pub fn new(controller: Arc<PairingFlowController>) -> Self {
        Self { controller }
    }

    pub async fn execute(&self) -> Result<Vec<ImportedFlow>, FlowError> {
        let gateways = self.controller.config().static_gateways();
        let span = info_span!("usecase.import_configured_gateways.execute", count = gateways.len());
        async {
            let mut imported = Vec::with_capacity(gateways.len());
            for gateway in gateways {
                match self.import_one(gateway).await {
                    Ok(flow) => imported.push(flow),
                    Err(err) => {
                        self.abandon_pending(imported).await;
                        return Err(err);
                    }
                }
            }
            Ok(imported)
        }
        .instrument(span)
        .await
    }

    async fn import_one(&self, gateway: GatewayDescriptor) -> Result<ImportedFlow, FlowError> {
        let gateway_id = gateway.id.clone();
        let key = gateway.key.clone();
        let mut ctx = FlowContext::new();

        let mut result = self.controller.step_import(&mut ctx, gateway).await?;

        let waiting_for_key = matches!(
            result,
            FlowResult::ShowForm {
                step_id: StepId::Key,
                ..
            }
        );
        if let (true, Some(key)) = (waiting_for_key, key) {
            let input = FormInput::new().with(FIELD_KEY, key);
            match self.controller.step_key(&mut ctx, Some(input)).await {
                Ok(next) => result = next,
                Err(err) => {
                    self.controller.abandon(ctx).await;
                    return Err(err);
                }
            }
        }

        info!(gateway_id = %gateway_id, finished = ctx.is_finished(), "configured gateway imported");
        let context = if ctx.is_finished() { None } else { Some(ctx) };
        Ok(ImportedFlow {
            gateway_id,
            result,
            context,
        })
    }

    /// Release the flows of an import run that failed part way.
    async fn abandon_pending(&self, imported: Vec<ImportedFlow>) {
        for flow in imported {
            if let Some(ctx) = flow.context {
                self.controller.abandon(ctx).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gp_core::config::StaticGatewayConfig;
    use gp_core::ports::{ConfigEntryStorePort, EntryStoreError};
    use gp_core::{ConfigEntry, PairingConfig};
    use gp_infra::{InMemoryFlowRegistry, StaticGatewayDiscovery};

    /// Store that holds nothing and refuses every write.
    struct ReadOnlyStore;

    #[async_trait]
    impl ConfigEntryStorePort for ReadOnlyStore {
        async fn list_entries(&self) -> Result<Vec<ConfigEntry>, EntryStoreError> {
            Ok(Vec::new())
        }

        async fn create_entry(&self, _entry: ConfigEntry) -> Result<(), EntryStoreError> {
            Err(EntryStoreError::Storage("read-only file system".into()))
        }
    }

    fn declared(id: &str, key: Option<&str>) -> StaticGatewayConfig {
        StaticGatewayConfig {
            id: id.into(),
            address: "10.0.0.1".into(),
            port: 9898,
            key: key.map(str::to_string),
            interface: None,
        }
    }

    #[tokio::test]
    async fn failed_import_releases_flows_still_open() {
        let config = PairingConfig {
            gateways: vec![declared("aa", None), declared("bb", Some("secret"))],
            ..PairingConfig::default()
        };
        let registry = Arc::new(InMemoryFlowRegistry::new());
        let controller = Arc::new(PairingFlowController::new(
            Arc::new(config),
            Arc::new(StaticGatewayDiscovery::empty()),
            Arc::new(ReadOnlyStore),
            registry.clone(),
        ));

        let err = ImportConfiguredGateways::new(controller)
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlowError::EntryStore(EntryStoreError::Storage(_))
        ));
        assert_eq!(registry.len().await, 0);
    }
}
