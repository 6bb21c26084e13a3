//! Input and output declarations of a job.

use serde::{Deserialize, Serialize};

use crate::JobOption;

/// A declared input: one path, or a list of fragments spliced verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputSpec {
    Path(String),
    Fragments(Vec<String>),
}

impl InputSpec {
    /// Argv tokens for this input, in declaration order.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            InputSpec::Path(path) => vec![path.clone()],
            InputSpec::Fragments(fragments) => fragments.clone(),
        }
    }

    /// Human-readable form for logs and error messages.
    pub fn label(&self) -> String {
        match self {
            InputSpec::Path(path) => path.clone(),
            InputSpec::Fragments(fragments) => fragments.join(" "),
        }
    }
}

impl From<&str> for InputSpec {
    fn from(value: &str) -> Self {
        InputSpec::Path(value.to_string())
    }
}

/// A declared output: an optional destination plus options dedicated to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "OutputRepr")]
pub struct OutputSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<JobOption>,
}

impl OutputSpec {
    pub fn to_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: JobOption) -> Self {
        self.options.push(option);
        self
    }
}

/// Outputs arrive either as a bare path string or as a full record.
#[derive(Deserialize)]
#[serde(untagged)]
enum OutputRepr {
    Path(String),
    Record {
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        options: Vec<JobOption>,
    },
}

impl From<OutputRepr> for OutputSpec {
    fn from(repr: OutputRepr) -> Self {
        match repr {
            OutputRepr::Path(path) => OutputSpec::to_path(path),
            OutputRepr::Record { path, options } => OutputSpec { path, options },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_spec_forms() {
        let inputs: Vec<InputSpec> =
            serde_json::from_value(json!(["/in/a.mp4", ["/in/p1.ts", "/in/p2.ts"]])).unwrap();

        assert_eq!(inputs[0].tokens(), vec!["/in/a.mp4"]);
        assert_eq!(inputs[1].tokens(), vec!["/in/p1.ts", "/in/p2.ts"]);
        assert_eq!(inputs[1].label(), "/in/p1.ts /in/p2.ts");
    }

    #[test]
    fn test_output_spec_forms() {
        let outputs: Vec<OutputSpec> = serde_json::from_value(json!([
            "/out/b.mp4",
            {"path": "/out/c.mp3", "options": [{"id": "disable_video", "value": true}]},
            {"options": [{"id": "f", "value": "null"}]}
        ]))
        .unwrap();

        assert_eq!(outputs[0], OutputSpec::to_path("/out/b.mp4"));
        assert_eq!(
            outputs[1],
            OutputSpec::to_path("/out/c.mp3").with_option(JobOption::new("disable_video", true))
        );
        assert_eq!(outputs[2].path, None);
        assert_eq!(outputs[2].options.len(), 1);
    }
}
