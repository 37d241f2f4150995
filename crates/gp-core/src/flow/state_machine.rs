//! Pairing flow state machine.
//!
//! Defines a pure state transition function for the gateway pairing flow.
//! Everything that touches the outside world (discovery, the entry store,
//! the flow registry, the UI) is emitted as a [`FlowAction`] for the
//! application layer to execute.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entry::{ConfigRecord, EntrySource};
use crate::flow::result::AbortReason;
use crate::gateway::{DiscoveredGateways, GatewayChoice, GatewayDescriptor};
use crate::ids::GatewayId;

/// Pairing flow state.
///
/// 配对流程状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    /// Nothing discovered yet.
    ///
    /// 尚未开始发现。
    Init,
    /// Several gateways found; waiting for the user to pick one.
    ///
    /// 发现多个网关，等待用户选择。
    AwaitingGatewayChoice { candidates: DiscoveredGateways },
    /// A gateway is bound; waiting for its pairing key.
    ///
    /// 已绑定网关，等待输入配对密钥。
    AwaitingKey {
        gateway: GatewayDescriptor,
        source: EntrySource,
    },
    /// Entry created.
    ///
    /// 已创建配置条目。
    Done { gateway_id: GatewayId },
    /// Flow aborted.
    ///
    /// 流程已中止。
    Aborted { reason: AbortReason },
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Done { .. } | FlowState::Aborted { .. })
    }

    /// Gateway currently bound to the flow, if any.
    pub fn bound_gateway(&self) -> Option<&GatewayDescriptor> {
        match self {
            FlowState::AwaitingKey { gateway, .. } => Some(gateway),
            _ => None,
        }
    }

    /// Gateways discovered by this flow and still offered to the user.
    pub fn discovered_gateways(&self) -> Option<&DiscoveredGateways> {
        match self {
            FlowState::AwaitingGatewayChoice { candidates } => Some(candidates),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Init => "init",
            FlowState::AwaitingGatewayChoice { .. } => "awaiting_gateway_choice",
            FlowState::AwaitingKey { .. } => "awaiting_key",
            FlowState::Done { .. } => "done",
            FlowState::Aborted { .. } => "aborted",
        }
    }
}

/// Events that drive the pairing flow.
///
/// 驱动配对流程的事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// Discovery step invoked without a usable selection.
    ///
    /// 未携带有效选择的发现步骤。
    DiscoveryRequested,
    /// User picked a gateway from the choice form.
    ///
    /// 用户选择了网关。
    GatewaySelected { id: GatewayId },
    /// Discovery finished (from orchestrator).
    ///
    /// 发现完成（编排器回填）。
    GatewaysDiscovered {
        gateways: Vec<GatewayDescriptor>,
        configured: HashSet<GatewayId>,
    },
    /// Key step invoked without input.
    ///
    /// 无输入的密钥步骤。
    KeyFormRequested,
    /// User submitted the pairing key.
    ///
    /// 用户提交配对密钥。
    KeySubmitted { key: String },
    /// Import from static configuration.
    ///
    /// 从静态配置导入。
    ImportRequested {
        gateway: GatewayDescriptor,
        configured: HashSet<GatewayId>,
    },
    /// The entry store refused the entry because the id is already taken.
    ///
    /// 条目存储因 id 重复而拒绝。
    EntryRejected,
}

impl FlowEvent {
    /// Event name for logs; never includes the submitted key.
    pub fn name(&self) -> &'static str {
        match self {
            FlowEvent::DiscoveryRequested => "discovery_requested",
            FlowEvent::GatewaySelected { .. } => "gateway_selected",
            FlowEvent::GatewaysDiscovered { .. } => "gateways_discovered",
            FlowEvent::KeyFormRequested => "key_form_requested",
            FlowEvent::KeySubmitted { .. } => "key_submitted",
            FlowEvent::ImportRequested { .. } => "import_requested",
            FlowEvent::EntryRejected => "entry_rejected",
        }
    }
}

/// Side-effects produced by state transitions.
///
/// 状态迁移产生的副作用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    /// Enumerate gateways on the local network.
    DiscoverGateways,
    /// Claim the gateway id for this flow (non-blocking).
    RegisterUniqueId { unique_id: GatewayId },
    /// Ask the user to pick one of several gateways.
    ShowGatewayChoice { choices: Vec<GatewayChoice> },
    /// Ask the user for the pairing key.
    ShowKeyForm,
    /// Persist the pairing result.
    CreateEntry {
        record: ConfigRecord,
        source: EntrySource,
    },
    /// End the flow without an entry.
    Abort { reason: AbortReason },
}

impl FlowAction {
    pub fn name(&self) -> &'static str {
        match self {
            FlowAction::DiscoverGateways => "discover_gateways",
            FlowAction::RegisterUniqueId { .. } => "register_unique_id",
            FlowAction::ShowGatewayChoice { .. } => "show_gateway_choice",
            FlowAction::ShowKeyForm => "show_key_form",
            FlowAction::CreateEntry { .. } => "create_entry",
            FlowAction::Abort { .. } => "abort",
        }
    }
}

/// Pure pairing flow state machine.
///
/// 纯状态机：不包含副作用。
pub struct PairingFlowStateMachine;

impl PairingFlowStateMachine {
    pub fn transition(state: FlowState, event: FlowEvent) -> (FlowState, Vec<FlowAction>) {
        match (state, event) {
            (FlowState::Done { .. }, FlowEvent::EntryRejected) => {
                Self::abort(AbortReason::AlreadyConfigured)
            }
            (state, _) if state.is_terminal() => (state, Vec::new()),

            (
                FlowState::AwaitingGatewayChoice { candidates },
                FlowEvent::GatewaySelected { id },
            ) => match candidates.take(&id) {
                Some(gateway) => Self::bind(gateway, EntrySource::User),
                None => (FlowState::Init, vec![FlowAction::DiscoverGateways]),
            },
            (_, FlowEvent::GatewaySelected { .. }) | (_, FlowEvent::DiscoveryRequested) => {
                (FlowState::Init, vec![FlowAction::DiscoverGateways])
            }

            (
                FlowState::Init | FlowState::AwaitingGatewayChoice { .. },
                FlowEvent::GatewaysDiscovered {
                    gateways,
                    configured,
                },
            ) => Self::on_discovered(gateways, &configured),

            (FlowState::Init, FlowEvent::ImportRequested { gateway, configured }) => {
                if configured.contains(&gateway.id) {
                    return Self::abort(AbortReason::AlreadyConfigured);
                }
                Self::bind(gateway, EntrySource::Import)
            }

            (state @ FlowState::AwaitingKey { .. }, FlowEvent::KeyFormRequested) => {
                (state, vec![FlowAction::ShowKeyForm])
            }
            (FlowState::AwaitingKey { gateway, source }, FlowEvent::KeySubmitted { key }) => (
                FlowState::Done {
                    gateway_id: gateway.id.clone(),
                },
                vec![FlowAction::CreateEntry {
                    record: ConfigRecord::from_gateway(&gateway, key),
                    source,
                }],
            ),

            (state, _event) => (state, Vec::new()),
        }
    }

    fn on_discovered(
        gateways: Vec<GatewayDescriptor>,
        configured: &HashSet<GatewayId>,
    ) -> (FlowState, Vec<FlowAction>) {
        if gateways.is_empty() {
            return Self::abort(AbortReason::NoGateways);
        }

        let candidates = gateways
            .into_iter()
            .collect::<DiscoveredGateways>()
            .without_configured(configured);
        if candidates.is_empty() {
            return Self::abort(AbortReason::AllConfigured);
        }

        match candidates.into_single() {
            Ok(gateway) => Self::bind(gateway, EntrySource::User),
            Err(candidates) => {
                let choices = candidates.choices();
                (
                    FlowState::AwaitingGatewayChoice { candidates },
                    vec![FlowAction::ShowGatewayChoice { choices }],
                )
            }
        }
    }

    fn bind(gateway: GatewayDescriptor, source: EntrySource) -> (FlowState, Vec<FlowAction>) {
        let unique_id = gateway.id.clone();
        (
            FlowState::AwaitingKey { gateway, source },
            vec![
                FlowAction::RegisterUniqueId { unique_id },
                FlowAction::ShowKeyForm,
            ],
        )
    }

    fn abort(reason: AbortReason) -> (FlowState, Vec<FlowAction>) {
        (
            FlowState::Aborted { reason },
            vec![FlowAction::Abort { reason }],
        )
    }
}
