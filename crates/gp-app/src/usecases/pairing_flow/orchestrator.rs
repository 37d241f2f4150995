//! Pairing flow controller.
//!
//! This module coordinates the pairing flow state machine and side effects.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use gp_core::{
    entry::ConfigEntry,
    flow::form::{FIELD_GATEWAY_ID, FIELD_KEY},
    flow::{
        FlowAction, FlowEvent, FlowResult, FlowState, FormInput, FormInputError, FormSchema,
        PairingFlowStateMachine, StepId,
    },
    gateway::GatewayDescriptor,
    ports::{
        ConfigEntryStorePort, EntryStoreError, FlowRegistryError, FlowRegistryPort,
        GatewayDiscoveryPort,
    },
    GatewayId, PairingConfig,
};

use super::context::FlowContext;

/// Errors produced by the pairing flow controller.
///
/// Abort reasons are not errors; they come back as [`FlowResult::Abort`].
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("gateway discovery failed: {0}")]
    Discovery(#[source] anyhow::Error),
    #[error("entry store failed: {0}")]
    EntryStore(#[from] EntryStoreError),
    #[error("flow registry failed: {0}")]
    Registry(#[from] FlowRegistryError),
    #[error("invalid input for step {step}: {source}")]
    InvalidInput {
        step: StepId,
        #[source]
        source: FormInputError,
    },
    #[error("step {step} is not valid in state {state}")]
    UnexpectedStep { step: StepId, state: &'static str },
    #[error("flow already finished")]
    FlowFinished,
}

/// One step invocation coming from the host flow engine.
#[derive(Debug, Clone)]
pub enum StepRequest {
    /// Default entry point.
    User(Option<FormInput>),
    /// Discovery step, optionally carrying a gateway selection.
    Init(Option<FormInput>),
    /// Key step, optionally carrying the pairing key.
    Key(Option<FormInput>),
    /// Import of a statically configured gateway.
    Import(GatewayDescriptor),
}

impl StepRequest {
    pub fn step_id(&self) -> StepId {
        match self {
            StepRequest::User(_) => StepId::User,
            StepRequest::Init(_) => StepId::Init,
            StepRequest::Key(_) => StepId::Key,
            StepRequest::Import(_) => StepId::Import,
        }
    }
}

#[derive(Default)]
struct ActionOutcome {
    result: Option<FlowResult>,
    follow_up_events: Vec<FlowEvent>,
}

/// Controller that drives pairing flows and their side effects.
///
/// Holds only collaborators and configuration; per-flow data lives in the
/// [`FlowContext`] the host passes to every step.
pub struct PairingFlowController {
    config: Arc<PairingConfig>,
    discovery: Arc<dyn GatewayDiscoveryPort>,
    entry_store: Arc<dyn ConfigEntryStorePort>,
    flow_registry: Arc<dyn FlowRegistryPort>,
}

impl PairingFlowController {
    pub fn new(
        config: Arc<PairingConfig>,
        discovery: Arc<dyn GatewayDiscoveryPort>,
        entry_store: Arc<dyn ConfigEntryStorePort>,
        flow_registry: Arc<dyn FlowRegistryPort>,
    ) -> Self {
        Self {
            config,
            discovery,
            entry_store,
            flow_registry,
        }
    }

    pub fn config(&self) -> &PairingConfig {
        &self.config
    }

    /// Flow started by the user. Kept for backwards compatibility; same as
    /// [`step_init`](Self::step_init).
    pub async fn step_user(
        &self,
        ctx: &mut FlowContext,
        input: Option<FormInput>,
    ) -> Result<FlowResult, FlowError> {
        self.dispatch(ctx, StepRequest::User(input)).await
    }

    pub async fn step_init(
        &self,
        ctx: &mut FlowContext,
        input: Option<FormInput>,
    ) -> Result<FlowResult, FlowError> {
        self.dispatch(ctx, StepRequest::Init(input)).await
    }

    pub async fn step_key(
        &self,
        ctx: &mut FlowContext,
        input: Option<FormInput>,
    ) -> Result<FlowResult, FlowError> {
        self.dispatch(ctx, StepRequest::Key(input)).await
    }

    pub async fn step_import(
        &self,
        ctx: &mut FlowContext,
        gateway: GatewayDescriptor,
    ) -> Result<FlowResult, FlowError> {
        self.dispatch(ctx, StepRequest::Import(gateway)).await
    }

    /// Run one step.
    ///
    /// A step that fails leaves the flow in the state it had before the
    /// call, so the host may retry it.
    pub async fn dispatch(
        &self,
        ctx: &mut FlowContext,
        request: StepRequest,
    ) -> Result<FlowResult, FlowError> {
        if ctx.is_finished() {
            return Err(FlowError::FlowFinished);
        }

        let step = request.step_id();
        let span = info_span!(parent: ctx.span(), "usecase.pairing_flow.dispatch", step = %step);
        async {
            let before = ctx.state().clone();
            let outcome = match self.to_event(ctx, step, request).await {
                Ok(event) => self.run(ctx, step, event).await,
                Err(err) => Err(err),
            };

            match outcome {
                Ok(result) => {
                    if ctx.is_finished() {
                        self.release(ctx).await;
                    }
                    Ok(result)
                }
                Err(err) => {
                    warn!(error = %err, "pairing flow step failed");
                    ctx.set_state(before);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Drop a flow the host no longer drives and release its unique id.
    pub async fn abandon(&self, ctx: FlowContext) {
        info!(parent: ctx.span(), state = ctx.state().name(), "pairing flow abandoned");
        self.release(&ctx).await;
    }

    async fn to_event(
        &self,
        ctx: &FlowContext,
        step: StepId,
        request: StepRequest,
    ) -> Result<FlowEvent, FlowError> {
        let invalid = |source: FormInputError| FlowError::InvalidInput { step, source };
        match request {
            StepRequest::User(input) | StepRequest::Init(input) => {
                let selection = input.filter(|input| !input.is_empty());
                match selection {
                    // A selection only means something while a choice form is pending.
                    Some(input) if ctx.discovered_gateways().is_some() => {
                        let id = input.required_str(FIELD_GATEWAY_ID).map_err(invalid)?;
                        Ok(FlowEvent::GatewaySelected {
                            id: GatewayId::from(id),
                        })
                    }
                    _ => Ok(FlowEvent::DiscoveryRequested),
                }
            }
            StepRequest::Key(input) => {
                if ctx.gateway().is_none() {
                    return Err(FlowError::UnexpectedStep {
                        step,
                        state: ctx.state().name(),
                    });
                }
                match input.filter(|input| !input.is_empty()) {
                    None => Ok(FlowEvent::KeyFormRequested),
                    Some(input) => {
                        let key = input.required_str(FIELD_KEY).map_err(invalid)?;
                        Ok(FlowEvent::KeySubmitted {
                            key: key.to_string(),
                        })
                    }
                }
            }
            StepRequest::Import(gateway) => {
                if !matches!(ctx.state(), FlowState::Init) {
                    return Err(FlowError::UnexpectedStep {
                        step,
                        state: ctx.state().name(),
                    });
                }
                let configured = self.entry_store.configured_gateway_ids().await?;
                Ok(FlowEvent::ImportRequested {
                    gateway,
                    configured,
                })
            }
        }
    }

    async fn run(
        &self,
        ctx: &mut FlowContext,
        step: StepId,
        event: FlowEvent,
    ) -> Result<FlowResult, FlowError> {
        let mut pending_events = vec![event];
        let mut result = None;

        while let Some(event) = pending_events.pop() {
            let from = ctx.state().name();
            let event_name = event.name();
            let (next, actions) = PairingFlowStateMachine::transition(ctx.take_state(), event);
            info!(from, to = next.name(), event = event_name, "pairing flow transition");
            ctx.set_state(next);

            let outcome = self.execute_actions(ctx, actions).await?;
            if outcome.result.is_some() {
                result = outcome.result;
            }
            pending_events.extend(outcome.follow_up_events);
        }

        result.ok_or(FlowError::UnexpectedStep {
            step,
            state: ctx.state().name(),
        })
    }

    async fn execute_actions(
        &self,
        ctx: &FlowContext,
        actions: Vec<FlowAction>,
    ) -> Result<ActionOutcome, FlowError> {
        let mut outcome = ActionOutcome::default();
        for action in actions {
            debug!(action = action.name(), "pairing flow executing action");
            match action {
                FlowAction::DiscoverGateways => {
                    let event = self.discover_gateways().await?;
                    outcome.follow_up_events.push(event);
                }
                FlowAction::RegisterUniqueId { unique_id } => {
                    self.flow_registry
                        .set_unique_id(ctx.flow_id(), &unique_id, false)
                        .await?;
                    let competing = self
                        .flow_registry
                        .flows_for(&unique_id)
                        .await?
                        .into_iter()
                        .filter(|flow_id| flow_id != ctx.flow_id())
                        .count();
                    if competing > 0 {
                        info!(
                            unique_id = %unique_id,
                            competing,
                            "another pairing flow is in progress for this gateway"
                        );
                    }
                    debug!(unique_id = %unique_id, "pairing flow unique id registered");
                }
                FlowAction::ShowGatewayChoice { choices } => {
                    outcome.result = Some(FlowResult::ShowForm {
                        step_id: StepId::Init,
                        data_schema: FormSchema::gateway_choice(&choices),
                    });
                }
                FlowAction::ShowKeyForm => {
                    outcome.result = Some(FlowResult::ShowForm {
                        step_id: StepId::Key,
                        data_schema: FormSchema::pairing_key(),
                    });
                }
                FlowAction::CreateEntry { record, source } => {
                    let title = self.config.flow.entry_title.clone();
                    let entry =
                        ConfigEntry::new(&self.config.flow.domain, &title, source, record.clone());
                    match self.entry_store.create_entry(entry).await {
                        Ok(()) => {
                            info!(gateway_id = %record.id, "config entry created");
                            outcome.result = Some(FlowResult::CreateEntry {
                                title,
                                data: record,
                            });
                        }
                        Err(EntryStoreError::AlreadyConfigured(gateway_id)) => {
                            warn!(gateway_id = %gateway_id, "entry store rejected duplicate gateway");
                            outcome.follow_up_events.push(FlowEvent::EntryRejected);
                        }
                        Err(err) => {
                            error!(error = %err, "failed to create config entry");
                            return Err(err.into());
                        }
                    }
                }
                FlowAction::Abort { reason } => {
                    info!(reason = %reason, "pairing flow aborted");
                    outcome.result = Some(FlowResult::Abort { reason });
                }
            }
        }

        Ok(outcome)
    }

    async fn discover_gateways(&self) -> Result<FlowEvent, FlowError> {
        let options = self.config.discovery_options();
        debug!(interface = %options.interface, "starting discovery of gateways");

        let gateways = self.discovery.discover(&options).await.map_err(|err| {
            error!(error = %err, "gateway discovery failed");
            FlowError::Discovery(err)
        })?;

        let configured = if gateways.is_empty() {
            info!("no gateways discovered");
            HashSet::new()
        } else {
            info!(count = gateways.len(), "gateways discovered");
            self.entry_store.configured_gateway_ids().await?
        };

        Ok(FlowEvent::GatewaysDiscovered {
            gateways,
            configured,
        })
    }

    async fn release(&self, ctx: &FlowContext) {
        if let Err(err) = self.flow_registry.release(ctx.flow_id()).await {
            warn!(error = %err, "failed to release pairing flow registration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gp_core::entry::{ConfigRecord, EntrySource};
    use gp_core::flow::AbortReason;
    use gp_core::ports::DiscoveryOptions;
    use gp_infra::{InMemoryConfigEntryStore, InMemoryFlowRegistry};
    use mockall::mock;
    use serde_json::json;

    mock! {
        pub Discovery {}

        #[async_trait]
        impl GatewayDiscoveryPort for Discovery {
            async fn discover(
                &self,
                options: &DiscoveryOptions,
            ) -> anyhow::Result<Vec<GatewayDescriptor>>;
        }
    }

    fn gateway(id: &str, address: &str) -> GatewayDescriptor {
        GatewayDescriptor {
            id: GatewayId::from(id),
            address: address.to_string(),
            port: 9898,
            key: None,
            discovery_retry_count: 5,
            network_interface: "any".to_string(),
            proto_version: None,
        }
    }

    fn controller_with(
        discovery: MockDiscovery,
        store: Arc<InMemoryConfigEntryStore>,
        registry: Arc<InMemoryFlowRegistry>,
    ) -> PairingFlowController {
        PairingFlowController::new(
            Arc::new(PairingConfig::default()),
            Arc::new(discovery),
            store,
            registry,
        )
    }

    fn input(value: serde_json::Value) -> Option<FormInput> {
        Some(FormInput::from_json(value).unwrap())
    }

    #[tokio::test]
    async fn selecting_a_gateway_does_not_rediscover() {
        let mut discovery = MockDiscovery::new();
        discovery
            .expect_discover()
            .times(1)
            .returning(|_| Ok(vec![gateway("aa", "10.0.0.1"), gateway("bb", "10.0.0.2")]));
        let registry = Arc::new(InMemoryFlowRegistry::new());
        let controller = controller_with(
            discovery,
            Arc::new(InMemoryConfigEntryStore::new()),
            registry.clone(),
        );
        let mut ctx = FlowContext::new();

        let first = controller.step_user(&mut ctx, None).await.unwrap();
        assert!(matches!(
            first,
            FlowResult::ShowForm {
                step_id: StepId::Init,
                ..
            }
        ));

        let second = controller
            .step_init(&mut ctx, input(json!({"id": "bb"})))
            .await
            .unwrap();
        assert!(matches!(
            second,
            FlowResult::ShowForm {
                step_id: StepId::Key,
                ..
            }
        ));
        assert_eq!(ctx.gateway().unwrap().id, GatewayId::from("bb"));
        assert_eq!(
            registry.unique_id_of(ctx.flow_id()).await,
            Some(GatewayId::from("bb"))
        );
    }

    #[tokio::test]
    async fn discovery_uses_configured_interface() {
        let mut discovery = MockDiscovery::new();
        discovery
            .expect_discover()
            .withf(|options| options.interface == "any" && options.retries == 5)
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let controller = controller_with(
            discovery,
            Arc::new(InMemoryConfigEntryStore::new()),
            Arc::new(InMemoryFlowRegistry::new()),
        );

        let result = controller
            .step_init(&mut FlowContext::new(), None)
            .await
            .unwrap();

        assert_eq!(
            result,
            FlowResult::Abort {
                reason: AbortReason::NoGateways
            }
        );
    }

    #[tokio::test]
    async fn discovery_failure_propagates_and_keeps_flow_retryable() {
        let mut discovery = MockDiscovery::new();
        let mut calls = 0;
        discovery.expect_discover().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(anyhow::anyhow!("socket bind failed"))
            } else {
                Ok(vec![gateway("aa", "10.0.0.1")])
            }
        });
        let controller = controller_with(
            discovery,
            Arc::new(InMemoryConfigEntryStore::new()),
            Arc::new(InMemoryFlowRegistry::new()),
        );
        let mut ctx = FlowContext::new();

        let err = controller.step_init(&mut ctx, None).await.unwrap_err();
        assert!(matches!(err, FlowError::Discovery(_)));
        assert_eq!(ctx.state(), &FlowState::Init);

        let retried = controller.step_init(&mut ctx, None).await.unwrap();
        assert!(matches!(
            retried,
            FlowResult::ShowForm {
                step_id: StepId::Key,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn key_step_without_bound_gateway_is_rejected() {
        let controller = controller_with(
            MockDiscovery::new(),
            Arc::new(InMemoryConfigEntryStore::new()),
            Arc::new(InMemoryFlowRegistry::new()),
        );
        let mut ctx = FlowContext::new();

        let err = controller
            .step_key(&mut ctx, input(json!({"key": "abc"})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlowError::UnexpectedStep {
                step: StepId::Key,
                state: "init"
            }
        ));
    }

    #[tokio::test]
    async fn malformed_key_payload_is_an_input_error() {
        let mut discovery = MockDiscovery::new();
        discovery
            .expect_discover()
            .returning(|_| Ok(vec![gateway("aa", "10.0.0.1")]));
        let controller = controller_with(
            discovery,
            Arc::new(InMemoryConfigEntryStore::new()),
            Arc::new(InMemoryFlowRegistry::new()),
        );
        let mut ctx = FlowContext::new();
        controller.step_user(&mut ctx, None).await.unwrap();

        let err = controller
            .step_key(&mut ctx, input(json!({"secret": "abc"})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlowError::InvalidInput {
                step: StepId::Key,
                source: FormInputError::MissingField(_)
            }
        ));
        assert!(ctx.gateway().is_some());
    }

    #[tokio::test]
    async fn duplicate_created_meanwhile_aborts_already_configured() {
        let mut discovery = MockDiscovery::new();
        discovery
            .expect_discover()
            .returning(|_| Ok(vec![gateway("aa", "10.0.0.1")]));
        let store = Arc::new(InMemoryConfigEntryStore::new());
        let registry = Arc::new(InMemoryFlowRegistry::new());
        let controller = controller_with(discovery, store.clone(), registry.clone());
        let mut ctx = FlowContext::new();
        controller.step_user(&mut ctx, None).await.unwrap();

        // Another flow finished pairing the same gateway first.
        store
            .create_entry(ConfigEntry::new(
                "xiaomi_aqara",
                "Xiaomi Aqara",
                EntrySource::User,
                ConfigRecord::from_gateway(&gateway("aa", "10.0.0.1"), "other"),
            ))
            .await
            .unwrap();

        let result = controller
            .step_key(&mut ctx, input(json!({"key": "abc"})))
            .await
            .unwrap();

        assert_eq!(
            result,
            FlowResult::Abort {
                reason: AbortReason::AlreadyConfigured
            }
        );
        assert!(ctx.is_finished());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn finished_flow_refuses_further_steps() {
        let mut discovery = MockDiscovery::new();
        discovery.expect_discover().times(1).returning(|_| Ok(Vec::new()));
        let controller = controller_with(
            discovery,
            Arc::new(InMemoryConfigEntryStore::new()),
            Arc::new(InMemoryFlowRegistry::new()),
        );
        let mut ctx = FlowContext::new();
        controller.step_user(&mut ctx, None).await.unwrap();

        let err = controller.step_user(&mut ctx, None).await.unwrap_err();

        assert!(matches!(err, FlowError::FlowFinished));
    }

    #[tokio::test]
    async fn abandon_releases_unique_id() {
        let mut discovery = MockDiscovery::new();
        discovery
            .expect_discover()
            .returning(|_| Ok(vec![gateway("aa", "10.0.0.1")]));
        let registry = Arc::new(InMemoryFlowRegistry::new());
        let controller = controller_with(
            discovery,
            Arc::new(InMemoryConfigEntryStore::new()),
            registry.clone(),
        );
        let mut ctx = FlowContext::new();
        controller.step_user(&mut ctx, None).await.unwrap();
        assert_eq!(registry.len().await, 1);

        controller.abandon(ctx).await;

        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn selection_without_id_is_an_input_error() {
        let mut discovery = MockDiscovery::new();
        discovery
            .expect_discover()
            .times(1)
            .returning(|_| Ok(vec![gateway("aa", "10.0.0.1"), gateway("bb", "10.0.0.2")]));
        let controller = controller_with(
            discovery,
            Arc::new(InMemoryConfigEntryStore::new()),
            Arc::new(InMemoryFlowRegistry::new()),
        );
        let mut ctx = FlowContext::new();
        controller.step_init(&mut ctx, None).await.unwrap();

        let err = controller
            .step_init(&mut ctx, input(json!({"foo": "bb"})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlowError::InvalidInput {
                step: StepId::Init,
                source: FormInputError::MissingField(_),
            }
        ));
        assert!(matches!(ctx.state(), FlowState::AwaitingGatewayChoice { .. }));
        assert_eq!(ctx.discovered_gateways().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_flows_for_same_gateway_both_reach_key_entry() {
        let mut discovery = MockDiscovery::new();
        discovery
            .expect_discover()
            .times(2)
            .returning(|_| Ok(vec![gateway("aa", "10.0.0.1")]));
        let store = Arc::new(InMemoryConfigEntryStore::new());
        let registry = Arc::new(InMemoryFlowRegistry::new());
        let controller = controller_with(discovery, store.clone(), registry.clone());
        let (mut first, mut second) = (FlowContext::new(), FlowContext::new());

        for ctx in [&mut first, &mut second] {
            let result = controller.step_user(ctx, None).await.unwrap();
            assert!(matches!(
                result,
                FlowResult::ShowForm {
                    step_id: StepId::Key,
                    ..
                }
            ));
        }
        let flows = registry.flows_for(&GatewayId::from("aa")).await.unwrap();
        assert_eq!(flows.len(), 2);

        let created = controller
            .step_key(&mut first, input(json!({"key": "abc"})))
            .await
            .unwrap();
        let rejected = controller
            .step_key(&mut second, input(json!({"key": "xyz"})))
            .await
            .unwrap();

        assert!(matches!(created, FlowResult::CreateEntry { .. }));
        assert_eq!(
            rejected,
            FlowResult::Abort {
                reason: AbortReason::AlreadyConfigured
            }
        );
        let entries = store.list_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].data.key, "abc");
        assert_eq!(registry.len().await, 0);
    }
}
