//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::options::Scope;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while building or running an FFmpeg command.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Duplicate {scope} option identifier: {id}")]
    DuplicateOption { scope: Scope, id: String },

    #[error("Option identifier registered in both scopes: {0}")]
    AmbiguousScope(String),

    #[error("No inputs declared")]
    NoInputs,

    #[error("Tool not found: {0}")]
    ToolNotFound(PathBuf),

    #[error("Failed to launch {program}: {source}")]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    ProcessFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a process failure error.
    pub fn process_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ProcessFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Exit code of a failed run, when the process exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            MediaError::ProcessFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Whether the error comes from executing the tool rather than preparing it.
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            MediaError::SpawnFailed { .. } | MediaError::ProcessFailed { .. } | MediaError::Timeout(_)
        )
    }
}
