//! Job callback: one queue message in, one terminal state out.
//!
//! No error escapes [`JobHandler::handle`]. Every message ends as completed,
//! failed (error reply published) or deferred (nothing published). The
//! returned [`JobOutcome`] tells the caller whether to acknowledge it.

use std::sync::Arc;
use std::time::Instant;

use ffw_credentials::CredentialResolver;
use ffw_media::Transcoder;
use ffw_models::{CompletedMessage, ErrorMessage, JobId, JobMessage};
use ffw_queue::Publisher;
use tracing::{error, Instrument};

use crate::error::{Disposition, WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::params;
use crate::requirements::check_requirements;

/// Operation name attached to job log events.
pub const OPERATION: &str = "ffmpeg";

/// Terminal state of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Completed reply published
    Completed,
    /// Error reply published
    Failed,
    /// Requirements not met; nothing published
    Deferred,
    /// The job reached a result but the reply could not be published
    PublishFailed,
}

impl JobOutcome {
    /// Whether the message can be removed from the queue.
    pub fn should_ack(&self) -> bool {
        matches!(self, JobOutcome::Completed | JobOutcome::Failed)
    }
}

/// Runs the job pipeline and publishes its result.
pub struct JobHandler {
    transcoder: Transcoder,
    resolver: Arc<dyn CredentialResolver>,
    publisher: Arc<dyn Publisher>,
}

impl JobHandler {
    pub fn new(
        transcoder: Transcoder,
        resolver: Arc<dyn CredentialResolver>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            transcoder,
            resolver,
            publisher,
        }
    }

    /// Handle one raw message body.
    pub async fn handle(&self, body: &[u8]) -> JobOutcome {
        let raw = String::from_utf8_lossy(body).to_string();

        let message: JobMessage = match serde_json::from_slice(body) {
            Ok(message) => message,
            Err(e) => {
                let err = WorkerError::MalformedMessage(e.to_string());
                error!("Rejecting message: {}", err);
                return self.report(raw, &err, None).await;
            }
        };

        let logger = JobLogger::new(&message.job_id, OPERATION);
        let span = logger.create_span();
        async {
            match self.process(&message, &logger).await {
                Ok(produced) => {
                    logger.log_completion(&produced.join(", "));
                    metrics::record_job_completed();
                    let reply = CompletedMessage::new(message.job_id.clone(), produced);
                    match self.publisher.publish_completed(&reply).await {
                        Ok(()) => JobOutcome::Completed,
                        Err(e) => {
                            logger.log_error(&format!("failed to publish completion: {}", e));
                            JobOutcome::PublishFailed
                        }
                    }
                }
                Err(err) if err.disposition() == Disposition::Deferred => {
                    logger.log_deferred(&err.to_string());
                    metrics::record_job_deferred();
                    JobOutcome::Deferred
                }
                Err(err) => {
                    logger.log_error(&err.to_string());
                    self.report(raw, &err, Some(message.job_id.clone())).await
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn process(&self, message: &JobMessage, logger: &JobLogger) -> WorkerResult<Vec<String>> {
        check_requirements(&params::requirements(message)?).await?;

        let spec = params::extract(message, self.resolver.as_ref()).await?;
        logger.log_start(
            &spec
                .inputs
                .iter()
                .map(|input| input.label())
                .collect::<Vec<_>>()
                .join(", "),
        );

        let started = Instant::now();
        let result = self
            .transcoder
            .process(&spec.inputs, &spec.outputs, &spec.options)
            .await;
        metrics::record_ffmpeg_duration(started.elapsed().as_secs_f64(), result.is_ok());

        Ok(result?)
    }

    async fn report(&self, body: String, err: &WorkerError, job_id: Option<JobId>) -> JobOutcome {
        metrics::record_job_failed(err.kind());
        let reply = ErrorMessage::new(body, err.to_string(), job_id);
        match self.publisher.publish_error(&reply).await {
            Ok(()) => JobOutcome::Failed,
            Err(e) => {
                error!("Failed to publish error reply: {}", e);
                JobOutcome::PublishFailed
            }
        }
    }
}
