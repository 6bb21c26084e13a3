//! Worker metrics.
//!
//! Recorded through the `metrics` facade. Nothing is exported unless
//! [`init_exporter`] installed the Prometheus recorder.

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{WorkerError, WorkerResult};

/// Metric name constants for consistency.
pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "ffw_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "ffw_jobs_failed_total";
    pub const JOBS_DEFERRED_TOTAL: &str = "ffw_jobs_deferred_total";
    pub const FFMPEG_DURATION_SECONDS: &str = "ffw_ffmpeg_duration_seconds";
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
pub fn init_exporter(addr: SocketAddr) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter on {}: {}", addr, e)))
}

pub fn record_job_completed() {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
}

/// Record a failed job by error kind.
pub fn record_job_failed(kind: &str) {
    counter!(names::JOBS_FAILED_TOTAL, "kind" => kind.to_string()).increment(1);
}

pub fn record_job_deferred() {
    counter!(names::JOBS_DEFERRED_TOTAL).increment(1);
}

/// Record how long one tool invocation took, successful or not.
pub fn record_ffmpeg_duration(duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "failure" };
    histogram!(names::FFMPEG_DURATION_SECONDS, "status" => status).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::JOBS_COMPLETED_TOTAL.starts_with("ffw_"));
        assert!(names::JOBS_FAILED_TOTAL.ends_with("_total"));
        assert!(names::FFMPEG_DURATION_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_job_completed();
        record_job_failed("media");
        record_job_deferred();
        record_ffmpeg_duration(0.25, true);
    }
}
