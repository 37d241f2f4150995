//! Form contract between the flow and the host UI.
//!
//! The flow only describes which fields it needs; rendering is the host's
//! business.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::gateway::GatewayChoice;

/// Field carrying the selected gateway id on the `init` step.
pub const FIELD_GATEWAY_ID: &str = "id";
/// Field carrying the pairing key on the `key` step.
pub const FIELD_KEY: &str = "key";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Choice { options: Vec<ChoiceOption> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    pub fields: Vec<FormField>,
}

impl FormSchema {
    /// Required `id` field, one option per gateway labelled by its address.
    pub fn gateway_choice(choices: &[GatewayChoice]) -> Self {
        let options = choices
            .iter()
            .map(|choice| ChoiceOption {
                value: choice.id.to_string(),
                label: choice.address.clone(),
            })
            .collect();
        Self {
            fields: vec![FormField {
                name: FIELD_GATEWAY_ID.to_string(),
                required: true,
                kind: FieldKind::Choice { options },
            }],
        }
    }

    /// Required free-text `key` field.
    pub fn pairing_key() -> Self {
        Self {
            fields: vec![FormField {
                name: FIELD_KEY.to_string(),
                required: true,
                kind: FieldKind::Text,
            }],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormInputError {
    #[error("form input is not an object")]
    NotAnObject,
    #[error("required field missing: {0}")]
    MissingField(String),
    #[error("field {0} must be a string")]
    NotAString(String),
}

/// Raw payload submitted by the host for a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormInput(Map<String, Value>);

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a JSON object; anything else is malformed input.
    pub fn from_json(value: Value) -> Result<Self, FormInputError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(FormInputError::NotAnObject),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn required_str(&self, name: &str) -> Result<&str, FormInputError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Err(FormInputError::MissingField(name.to_string())),
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(FormInputError::NotAString(name.to_string())),
        }
    }
}
