//! Job queue using Redis Streams.

use std::time::Duration;

use redis::streams::{StreamClaimReply, StreamId, StreamReadReply};
use redis::AsyncCommands;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};

/// Stream entry field carrying the raw JSON body.
pub const PAYLOAD_FIELD: &str = "payload";

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream jobs are consumed from
    pub job_stream: String,
    /// Stream completed replies are published to
    pub completed_stream: String,
    /// Stream error replies are published to
    pub error_stream: String,
    /// Consumer group name
    pub consumer_group: String,
    /// How long a read blocks waiting for new jobs
    pub block: Duration,
    /// Pending jobs idle longer than this are re-claimed
    pub claim_min_idle: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            job_stream: "job_ffmpeg".to_string(),
            completed_stream: "job_ffmpeg_completed".to_string(),
            error_stream: "job_ffmpeg_error".to_string(),
            consumer_group: "ffmpeg_workers".to_string(),
            block: Duration::from_millis(1000),
            claim_min_idle: Duration::from_secs(60),
        }
    }
}

/// A message read from the job stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    /// Stream entry ID, used for acknowledgement
    pub id: String,
    /// Raw body as delivered
    pub payload: Vec<u8>,
}

/// Job queue client.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| QueueError::connection_failed(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Initialize the queue (create consumer group if not exists).
    ///
    /// The group starts at the beginning of the stream so jobs published
    /// before the first worker came up are still delivered.
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.job_stream)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Read new jobs for this consumer, blocking up to the configured time.
    pub async fn consume(&self, consumer_name: &str, count: usize) -> QueueResult<Vec<QueuedMessage>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // Nil reply when the block times out
        let reply: Option<StreamReadReply> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(self.config.block.as_millis() as u64)
            .arg("STREAMS")
            .arg(&self.config.job_stream)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        let messages: Vec<QueuedMessage> = reply
            .map(|reply| reply.keys.into_iter().flat_map(|key| key.ids).map(to_message).collect())
            .unwrap_or_default();

        if !messages.is_empty() {
            debug!("Consumed {} message(s) from {}", messages.len(), self.config.job_stream);
        }
        Ok(messages)
    }

    /// Acknowledge a job and remove it from the stream.
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.job_stream)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.job_stream)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("Acknowledged job: {}", message_id);
        Ok(())
    }

    /// Claim jobs that stayed pending longer than the configured idle time.
    ///
    /// Deferred jobs are never acknowledged, so this is how they come back
    /// once their requirements may have appeared. Jobs of crashed consumers
    /// are picked up the same way.
    pub async fn claim_pending(&self, consumer_name: &str, count: usize) -> QueueResult<Vec<QueuedMessage>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let min_idle_ms = self.config.claim_min_idle.as_millis() as u64;

        // (id, consumer, idle ms, delivery count)
        let pending: Vec<(String, String, u64, u64)> = redis::cmd("XPENDING")
            .arg(&self.config.job_stream)
            .arg(&self.config.consumer_group)
            .arg("IDLE")
            .arg(min_idle_ms)
            .arg("-")
            .arg("+")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = redis::cmd("XCLAIM");
        cmd.arg(&self.config.job_stream)
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(min_idle_ms);
        for (id, _, _, _) in &pending {
            cmd.arg(id);
        }
        let claimed: StreamClaimReply = cmd.query_async(&mut conn).await?;

        let messages: Vec<QueuedMessage> = claimed.ids.into_iter().map(to_message).collect();
        if !messages.is_empty() {
            info!("Claimed {} pending message(s) from {}", messages.len(), self.config.job_stream);
        }
        Ok(messages)
    }

    /// Append a JSON reply to `stream`. Returns the new entry ID.
    pub async fn publish<T: Serialize + Sync>(&self, stream: &str, message: &T) -> QueueResult<String> {
        let payload = encode(message)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let entry_id: String = conn
            .xadd(stream, "*", &[(PAYLOAD_FIELD, payload.as_str())])
            .await
            .map_err(|e| QueueError::publish_failed(format!("{}: {}", stream, e)))?;

        debug!("Published reply {} to {}", entry_id, stream);
        Ok(entry_id)
    }

    /// Get queue length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.job_stream).await?;
        Ok(len)
    }
}

fn encode<T: Serialize>(message: &T) -> QueueResult<String> {
    Ok(serde_json::to_string(message)?)
}

fn to_message(entry: StreamId) -> QueuedMessage {
    let payload = entry_payload(&entry).unwrap_or_else(|| {
        warn!("Message {} has no {} field", entry.id, PAYLOAD_FIELD);
        Vec::new()
    });
    QueuedMessage {
        id: entry.id,
        payload,
    }
}

fn entry_payload(entry: &StreamId) -> Option<Vec<u8>> {
    match entry.map.get(PAYLOAD_FIELD)? {
        redis::Value::BulkString(bytes) => Some(bytes.clone()),
        redis::Value::SimpleString(text) => Some(text.clone().into_bytes()),
        _ => None,
    }
}
