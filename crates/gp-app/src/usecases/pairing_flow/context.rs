use gp_core::flow::FlowState;
use gp_core::gateway::{DiscoveredGateways, GatewayDescriptor};
use gp_core::FlowId;
use tracing::{info_span, Span};

/// Per-flow transient state.
///
/// Created when a flow starts, handed to every step call by `&mut`, and
/// dropped once the flow reaches a terminal state (or is abandoned). The
/// controller itself keeps nothing between steps.
#[derive(Debug)]
pub struct FlowContext {
    flow_id: FlowId,
    state: FlowState,
    /// Parent span of every step of this flow.
    span: Span,
}

impl FlowContext {
    pub fn new() -> Self {
        Self::with_id(FlowId::new())
    }

    pub fn with_id(flow_id: FlowId) -> Self {
        let span = info_span!("pairing_flow", flow_id = %flow_id);
        Self {
            flow_id,
            state: FlowState::Init,
            span,
        }
    }

    pub fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Gateway bound by the discovery or import step.
    pub fn gateway(&self) -> Option<&GatewayDescriptor> {
        self.state.bound_gateway()
    }

    /// Gateways offered in the pending choice form.
    pub fn discovered_gateways(&self) -> Option<&DiscoveredGateways> {
        self.state.discovered_gateways()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub(crate) fn span(&self) -> &Span {
        &self.span
    }

    pub(crate) fn take_state(&mut self) -> FlowState {
        std::mem::replace(&mut self.state, FlowState::Init)
    }

    pub(crate) fn set_state(&mut self, state: FlowState) {
        self.state = state;
    }
}

impl Default for FlowContext {
    fn default() -> Self {
        Self::new()
    }
}
