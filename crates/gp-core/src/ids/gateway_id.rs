use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable gateway identifier reported by discovery (the gateway "sid").
///
/// Unlike [`FlowId`](super::FlowId) this is never generated locally, so it
/// has no `new()`; it always comes from the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayId(String);

impl GatewayId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for GatewayId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GatewayId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GatewayId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
