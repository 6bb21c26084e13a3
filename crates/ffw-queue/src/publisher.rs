//! Reply publishing seam.

use async_trait::async_trait;
use ffw_models::{CompletedMessage, ErrorMessage};

use crate::error::QueueResult;
use crate::queue::JobQueue;

/// Destination for job replies.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish_completed(&self, message: &CompletedMessage) -> QueueResult<()>;

    async fn publish_error(&self, message: &ErrorMessage) -> QueueResult<()>;
}

#[async_trait]
impl Publisher for JobQueue {
    async fn publish_completed(&self, message: &CompletedMessage) -> QueueResult<()> {
        self.publish(&self.config().completed_stream, message).await.map(|_| ())
    }

    async fn publish_error(&self, message: &ErrorMessage) -> QueueResult<()> {
        self.publish(&self.config().error_stream, message).await.map(|_| ())
    }
}
