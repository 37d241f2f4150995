//! ID type wrappers for type safety.

mod gateway_id;
mod id_macro;

use serde::{Deserialize, Serialize};

use id_macro::impl_id;

pub use gateway_id::GatewayId;

/// Identifier of a single pairing flow instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(String);

/// Identifier of a persisted config entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(String);

impl_id!(FlowId, EntryId);
