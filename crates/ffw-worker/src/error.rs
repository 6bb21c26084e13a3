//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// What the callback does with a job that hit an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Leave the job pending without replying; it is retried later
    Deferred,
    /// Publish an error reply and acknowledge the job
    Reported,
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Required path does not exist: {}", .0.join(", "))]
    RequirementNotMet(Vec<String>),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Failed to resolve credential parameter {parameter}: {source}")]
    Credential {
        parameter: String,
        #[source]
        source: ffw_credentials::CredentialError,
    },

    #[error(transparent)]
    Media(#[from] ffw_media::MediaError),

    #[error("Queue error: {0}")]
    Queue(#[from] ffw_queue::QueueError),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_job(msg: impl Into<String>) -> Self {
        Self::InvalidJob(msg.into())
    }

    pub fn credential(parameter: impl Into<String>, source: ffw_credentials::CredentialError) -> Self {
        Self::Credential {
            parameter: parameter.into(),
            source,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::ConfigError(_) => "config",
            WorkerError::RequirementNotMet(_) => "requirement",
            WorkerError::MalformedMessage(_) => "malformed",
            WorkerError::InvalidJob(_) => "invalid_job",
            WorkerError::Credential { .. } => "credential",
            WorkerError::Media(e) if e.is_execution_failure() => "process",
            WorkerError::Media(_) => "media",
            WorkerError::Queue(_) => "queue",
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            WorkerError::RequirementNotMet(_) => Disposition::Deferred,
            _ => Disposition::Reported,
        }
    }
}
