//! Step results returned to the host flow engine.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::entry::ConfigRecord;
use crate::flow::form::FormSchema;

/// Step identifiers understood by the host.
///
/// 宿主可识别的步骤标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    /// Default entry point, forwards to `Init`.
    User,
    /// Discovery and gateway choice.
    Init,
    /// Pairing key entry.
    Key,
    /// Import from static configuration.
    Import,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::User => "user",
            StepId::Init => "init",
            StepId::Key => "key",
            StepId::Import => "import",
        }
    }
}

impl Display for StepId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal abort reasons, surfaced verbatim to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Discovery returned nothing.
    NoGateways,
    /// Every discovered gateway already has an entry.
    AllConfigured,
    /// An entry with the same gateway id already exists.
    AlreadyConfigured,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::NoGateways => "no_gateways",
            AbortReason::AllConfigured => "all_configured",
            AbortReason::AlreadyConfigured => "already_configured",
        }
    }
}

impl Display for AbortReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    /// Ask the user for input; the flow suspends until the next step call.
    #[serde(rename = "form")]
    ShowForm {
        step_id: StepId,
        data_schema: FormSchema,
    },
    /// The flow ended without creating an entry.
    Abort { reason: AbortReason },
    /// The flow ended and an entry was created.
    CreateEntry { title: String, data: ConfigRecord },
}

impl FlowResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FlowResult::ShowForm { .. })
    }
}
