//! Job executor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use ffw_queue::{JobQueue, QueuedMessage};

use crate::callback::JobHandler;
use crate::error::WorkerResult;

/// How often pending messages are checked for re-claiming.
const CLAIM_INTERVAL: Duration = Duration::from_secs(30);

/// Messages taken per claim pass.
const CLAIM_BATCH: usize = 10;

/// Backoff after a failed queue read.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Decides when the next pending-message claim pass is due.
///
/// Claims run between reads so an in-flight `XREADGROUP` is never dropped
/// with entries already delivered to this consumer.
#[derive(Debug)]
struct ClaimSchedule {
    interval: Duration,
    next: Instant,
}

impl ClaimSchedule {
    fn new(interval: Duration, now: Instant) -> Self {
        Self { interval, next: now }
    }

    /// Whether a claim pass should run at `now`. Marks it as taken.
    fn due(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + self.interval;
        true
    }
}

/// Job executor that processes jobs from the queue one at a time.
pub struct JobExecutor {
    queue: Arc<JobQueue>,
    handler: JobHandler,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(queue: Arc<JobQueue>, handler: JobHandler) -> Self {
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Self {
            queue,
            handler,
            shutdown,
            consumer_name,
        }
    }

    /// Start the executor. Returns after [`JobExecutor::shutdown`] once the
    /// message in flight, if any, has reached its terminal state.
    pub async fn run(&self) -> WorkerResult<()> {
        info!("Starting job executor '{}'", self.consumer_name);

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut claims = ClaimSchedule::new(CLAIM_INTERVAL, Instant::now());

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            if claims.due(Instant::now()) {
                match self.queue.claim_pending(&self.consumer_name, CLAIM_BATCH).await {
                    Ok(messages) if !messages.is_empty() => {
                        info!("Claimed {} pending jobs", messages.len());
                        self.process_all(messages).await;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Failed to claim pending jobs: {}", e),
                }
                continue;
            }

            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.queue.consume(&self.consumer_name, 1) => {
                    match result {
                        Ok(messages) => self.process_all(messages).await,
                        Err(e) => {
                            error!("Error consuming jobs: {}", e);
                            tokio::time::sleep(ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }

        info!("Job executor stopped");
        Ok(())
    }

    async fn process_all(&self, messages: Vec<QueuedMessage>) {
        for message in messages {
            self.process_message(message).await;
        }
    }

    async fn process_message(&self, message: QueuedMessage) {
        debug!("Handling message {}", message.id);
        let outcome = self.handler.handle(&message.payload).await;

        if outcome.should_ack() {
            if let Err(e) = self.queue.ack(&message.id).await {
                error!("Failed to ack message {}: {}", message.id, e);
            }
        } else {
            debug!("Leaving message {} pending ({:?})", message.id, outcome);
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
