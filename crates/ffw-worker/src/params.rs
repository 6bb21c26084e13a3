//! Job parameter extraction.
//!
//! `requirements`, `source_paths` and `destination_paths` are reserved
//! parameter ids. Every other parameter is a tool option. Credential-typed
//! parameters carry a lookup key that is resolved before use.

use ffw_credentials::CredentialResolver;
use ffw_models::{InputSpec, JobMessage, JobOption, OptionValue, OutputSpec, Parameter, Requirements};
use serde_json::Value;

use crate::error::{WorkerError, WorkerResult};

pub const REQUIREMENTS: &str = "requirements";
pub const SOURCE_PATHS: &str = "source_paths";
pub const DESTINATION_PATHS: &str = "destination_paths";

/// Everything the media pipeline needs for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<OutputSpec>,
    /// Shared options in declaration order
    pub options: Vec<JobOption>,
}

/// The job's requirements, empty when none are declared.
pub fn requirements(message: &JobMessage) -> WorkerResult<Requirements> {
    let Some(value) = find(message, REQUIREMENTS).and_then(Parameter::effective_value) else {
        return Ok(Requirements::default());
    };
    serde_json::from_value(value.clone())
        .map_err(|e| WorkerError::invalid_job(format!("{}: {}", REQUIREMENTS, e)))
}

/// Resolve inputs, outputs and options, looking up credential parameters.
pub async fn extract(message: &JobMessage, resolver: &dyn CredentialResolver) -> WorkerResult<JobSpec> {
    let mut inputs = None;
    let mut outputs = None;
    let mut options = Vec::new();

    for param in &message.parameters {
        match param.id.as_str() {
            REQUIREMENTS => {}
            SOURCE_PATHS => inputs = Some(parse_inputs(resolve(param, resolver).await?)?),
            DESTINATION_PATHS => outputs = Some(parse_outputs(resolve(param, resolver).await?)?),
            _ => {
                let value = resolve(param, resolver).await?;
                let value = OptionValue::from_json(&value).ok_or_else(|| {
                    WorkerError::invalid_job(format!(
                        "{}: option value must be a boolean, number or string",
                        param.id
                    ))
                })?;
                options.push(JobOption {
                    id: param.id.clone(),
                    value,
                });
            }
        }
    }

    let inputs = inputs.ok_or_else(|| WorkerError::invalid_job(format!("missing {}", SOURCE_PATHS)))?;
    if inputs.is_empty() {
        return Err(WorkerError::invalid_job(format!("{} is empty", SOURCE_PATHS)));
    }

    let outputs = outputs.ok_or_else(|| WorkerError::invalid_job(format!("missing {}", DESTINATION_PATHS)))?;
    if outputs.is_empty() {
        return Err(WorkerError::invalid_job(format!("{} is empty", DESTINATION_PATHS)));
    }

    Ok(JobSpec {
        inputs,
        outputs,
        options,
    })
}

fn find<'a>(message: &'a JobMessage, id: &str) -> Option<&'a Parameter> {
    message.parameters.iter().find(|p| p.id == id)
}

async fn resolve(param: &Parameter, resolver: &dyn CredentialResolver) -> WorkerResult<Value> {
    let value = param
        .effective_value()
        .ok_or_else(|| WorkerError::invalid_job(format!("{}: no value or default", param.id)))?;

    if !param.is_credential() {
        return Ok(value.clone());
    }

    let key = value.as_str().ok_or_else(|| {
        WorkerError::invalid_job(format!("{}: credential key must be a string", param.id))
    })?;
    let secret = resolver
        .resolve(key)
        .await
        .map_err(|e| WorkerError::credential(&param.id, e))?;
    Ok(Value::String(secret))
}

fn parse_inputs(value: Value) -> WorkerResult<Vec<InputSpec>> {
    match value {
        Value::String(path) => Ok(vec![InputSpec::Path(path)]),
        value @ Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| WorkerError::invalid_job(format!("{}: {}", SOURCE_PATHS, e))),
        _ => Err(WorkerError::invalid_job(format!(
            "{}: expected a path or a list of paths",
            SOURCE_PATHS
        ))),
    }
}

fn parse_outputs(value: Value) -> WorkerResult<Vec<OutputSpec>> {
    match value {
        Value::String(path) => Ok(vec![OutputSpec::to_path(path)]),
        value @ Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| WorkerError::invalid_job(format!("{}: {}", DESTINATION_PATHS, e))),
        _ => Err(WorkerError::invalid_job(format!(
            "{}: expected a path or a list of outputs",
            DESTINATION_PATHS
        ))),
    }
}
