//! Queue-driven FFmpeg job worker.
//!
//! This crate provides:
//! - Configuration loading from the environment and INI files
//! - Job parameter extraction with credential resolution
//! - The job callback publishing completed and error replies
//! - The executor loop with pending-job re-claiming and graceful shutdown

pub mod callback;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod params;
pub mod requirements;

pub use callback::{JobHandler, JobOutcome};
pub use config::{ConfigSource, WorkerConfig};
pub use error::{Disposition, WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
