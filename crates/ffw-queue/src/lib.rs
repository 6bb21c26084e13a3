//! Redis Streams job queue.
//!
//! This crate provides:
//! - Job consumption through a consumer group
//! - Acknowledgement of finished jobs
//! - Re-claiming of jobs left pending
//! - Publishing of completed and error replies

pub mod error;
pub mod publisher;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use publisher::Publisher;
pub use queue::{JobQueue, QueueConfig, QueuedMessage, PAYLOAD_FIELD};
