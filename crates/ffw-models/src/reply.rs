//! Replies published to the completed and error queues.

use serde::{Deserialize, Serialize};

use crate::JobId;

/// Status value carried by every completed reply.
pub const COMPLETED_STATUS: &str = "completed";

/// Job type tag carried by every error reply.
pub const JOB_TYPE: &str = "job_ffmpeg";

/// Reply for a job that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedMessage {
    pub status: String,
    pub job_id: JobId,
    /// Produced destination paths
    pub output: Vec<String>,
}

impl CompletedMessage {
    pub fn new(job_id: JobId, output: Vec<String>) -> Self {
        Self {
            status: COMPLETED_STATUS.to_string(),
            job_id,
            output,
        }
    }
}

/// Reply for a job that failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Original raw payload
    pub body: String,
    pub error: String,
    /// Absent when the payload could not be parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(rename = "type")]
    pub job_type: String,
}

impl ErrorMessage {
    pub fn new(body: impl Into<String>, error: impl Into<String>, job_id: Option<JobId>) -> Self {
        Self {
            body: body.into(),
            error: error.into(),
            job_id,
            job_type: JOB_TYPE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completed_shape() {
        let msg = CompletedMessage::new(JobId::Number(7), vec!["/out/b.mp4".to_string()]);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"status": "completed", "job_id": 7, "output": ["/out/b.mp4"]})
        );
    }

    #[test]
    fn test_error_shape_omits_missing_job_id() {
        let msg = ErrorMessage::new("{not json", "expected value", None);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"body": "{not json", "error": "expected value", "type": "job_ffmpeg"})
        );

        let msg = ErrorMessage::new("{}", "boom", Some(JobId::Text("j-1".to_string())));
        assert_eq!(serde_json::to_value(&msg).unwrap()["job_id"], json!("j-1"));
    }
}
