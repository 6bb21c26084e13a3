//! Tool options.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Value of a tool option.
///
/// `true` means "flag present, no argument", `false` means "omit the
/// option entirely". Numbers and strings become the flag's argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Number(Number),
    Text(String),
}

impl OptionValue {
    /// Convert a JSON scalar. Arrays, objects and null are not option values.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(OptionValue::Flag(*b)),
            Value::Number(n) => Some(OptionValue::Number(n.clone())),
            Value::String(s) => Some(OptionValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Canonical argument string, or `None` for boolean values.
    pub fn argument(&self) -> Option<String> {
        match self {
            OptionValue::Flag(_) => None,
            OptionValue::Number(n) => Some(n.to_string()),
            OptionValue::Text(s) => Some(s.clone()),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, OptionValue::Flag(false))
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Flag(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Number(value.into())
    }
}

/// An abstract `(identifier, value)` tool option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOption {
    pub id: String,
    pub value: OptionValue,
}

impl JobOption {
    pub fn new(id: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_argument_uses_natural_decimal_form() {
        assert_eq!(OptionValue::from_json(&json!(44100)).unwrap().argument(), Some("44100".to_string()));
        assert_eq!(OptionValue::from_json(&json!(0.5)).unwrap().argument(), Some("0.5".to_string()));
        assert_eq!(OptionValue::from_json(&json!(-3)).unwrap().argument(), Some("-3".to_string()));
        assert_eq!(OptionValue::from_json(&json!("aac")).unwrap().argument(), Some("aac".to_string()));
        assert_eq!(OptionValue::from_json(&json!(true)).unwrap().argument(), None);
    }

    #[test]
    fn test_from_json_rejects_non_scalars() {
        assert!(OptionValue::from_json(&json!(null)).is_none());
        assert!(OptionValue::from_json(&json!(["a"])).is_none());
        assert!(OptionValue::from_json(&json!({"a": 1})).is_none());
    }

    #[test]
    fn test_job_option_deserialize() {
        let opt: JobOption = serde_json::from_value(json!({"id": "disable_video", "value": true})).unwrap();
        assert_eq!(opt, JobOption::new("disable_video", true));
        assert!(!opt.value.is_disabled());

        let opt: JobOption = serde_json::from_value(json!({"id": "audio_channels", "value": 2})).unwrap();
        assert_eq!(opt, JobOption::new("audio_channels", 2));
    }
}
