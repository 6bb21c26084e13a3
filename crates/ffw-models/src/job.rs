//! Inbound job message definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a job as sent by the producer.
///
/// Producers send either a number or a string; the worker echoes the
/// original representation back in its replies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
    Number(i64),
    Text(String),
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobId::Number(n) => write!(f, "{}", n),
            JobId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for JobId {
    fn from(value: i64) -> Self {
        JobId::Number(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        JobId::Text(value.to_string())
    }
}

/// A job message consumed from the inbound queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    pub job_id: JobId,
    /// Ordered parameter list
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// Discriminator carried in a parameter's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Value is a key to look up through the credential backend
    Credential,
    /// Any other declared type; the value is used literally
    #[default]
    #[serde(other)]
    Literal,
}

/// One entry of a job's parameter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: ParameterKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl Parameter {
    /// Create a literal parameter.
    pub fn new(id: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            kind: ParameterKind::Literal,
            value: Some(value),
            default: None,
        }
    }

    /// Create a credential parameter whose value is the lookup key.
    pub fn credential(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ParameterKind::Credential,
            value: Some(serde_json::Value::String(key.into())),
            default: None,
        }
    }

    pub fn is_credential(&self) -> bool {
        self.kind == ParameterKind::Credential
    }

    /// The declared value, falling back to the default. JSON `null` counts
    /// as absent.
    pub fn effective_value(&self) -> Option<&serde_json::Value> {
        self.value
            .as_ref()
            .filter(|v| !v.is_null())
            .or_else(|| self.default.as_ref().filter(|v| !v.is_null()))
    }
}

/// Preconditions a job declares before it may run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    /// Filesystem paths that must exist
    #[serde(default)]
    pub paths: Vec<String>,
}
