//! Shared wire models for the FFmpeg job worker.
//!
//! This crate provides Serde-serializable types for:
//! - Inbound job messages and their parameter lists
//! - Tool options and their values
//! - Input and output declarations
//! - Completed / error replies

pub mod job;
pub mod media;
pub mod option;
pub mod reply;

// Re-export common types
pub use job::{JobId, JobMessage, Parameter, ParameterKind, Requirements};
pub use media::{InputSpec, OutputSpec};
pub use option::{JobOption, OptionValue};
pub use reply::{CompletedMessage, ErrorMessage, COMPLETED_STATUS, JOB_TYPE};
