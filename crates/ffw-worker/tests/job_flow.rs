//! End-to-end job handling against a fake ffmpeg executable.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use ffw_credentials::NoCredentialBackend;
use ffw_media::{CommandAssembler, FfmpegRunner, OptionTranslator, StderrPolicy, Transcoder};
use ffw_models::{CompletedMessage, ErrorMessage, JobId};
use ffw_queue::{Publisher, QueueResult};
use ffw_worker::{JobHandler, JobOutcome};

#[derive(Default)]
struct RecordingPublisher {
    completed: Mutex<Vec<CompletedMessage>>,
    errors: Mutex<Vec<ErrorMessage>>,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish_completed(&self, message: &CompletedMessage) -> QueueResult<()> {
        self.completed.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn publish_error(&self, message: &ErrorMessage) -> QueueResult<()> {
        self.errors.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Writes a fake ffmpeg that records its argv, then runs `body`.
fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("ffmpeg");
    let argv_file = dir.join("argv.txt");
    std::fs::write(
        &path,
        format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n{}\n",
            argv_file.display(),
            body
        ),
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn recorded_argv(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("argv.txt"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn handler(tool: PathBuf, policy: StderrPolicy, publisher: Arc<RecordingPublisher>) -> JobHandler {
    let transcoder = Transcoder::new(
        tool,
        CommandAssembler::new(OptionTranslator::standard().unwrap()),
        FfmpegRunner::new().with_policy(policy),
    );
    JobHandler::new(transcoder, Arc::new(NoCredentialBackend), publisher)
}

#[tokio::test]
async fn test_completed_job_argv_and_reply() {
    let tools = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = work.path().join("in/a.mp4");
    std::fs::create_dir_all(input.parent().unwrap()).unwrap();
    std::fs::write(&input, b"").unwrap();
    let output = work.path().join("out/b.mp4");

    let body = json!({
        "job_id": 42,
        "parameters": [
            {"id": "requirements", "type": "requirements", "value": {"paths": [input]}},
            {"id": "source_paths", "type": "array_of_strings", "value": [input]},
            {"id": "destination_paths", "type": "array_of_strings", "value": [{"path": output}]},
            {"id": "output_codec_video", "type": "string", "value": "h264"},
            {"id": "force_overwrite", "type": "boolean", "value": true}
        ]
    })
    .to_string();

    let publisher = Arc::new(RecordingPublisher::default());
    let tool = fake_ffmpeg(tools.path(), "exit 0");
    let outcome = handler(tool, StderrPolicy::ExitCode, publisher.clone())
        .handle(body.as_bytes())
        .await;

    assert_eq!(outcome, JobOutcome::Completed);
    assert!(work.path().join("out").is_dir());

    let output = output.to_string_lossy().to_string();
    let argv = recorded_argv(tools.path());
    assert_eq!(
        argv,
        vec![
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-codec:v".to_string(),
            "h264".to_string(),
            "-y".to_string(),
            output.clone(),
        ]
    );

    let completed = publisher.completed.lock().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0], CompletedMessage::new(JobId::Number(42), vec![output]));
    assert!(publisher.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_requirement_publishes_nothing() {
    let tools = TempDir::new().unwrap();
    let body = json!({
        "job_id": 1,
        "parameters": [
            {"id": "requirements", "value": {"paths": ["/nonexistent/in/a.mp4"]}},
            {"id": "source_paths", "value": ["/nonexistent/in/a.mp4"]},
            {"id": "destination_paths", "value": ["/nonexistent/out/b.mp4"]}
        ]
    })
    .to_string();

    let publisher = Arc::new(RecordingPublisher::default());
    let tool = fake_ffmpeg(tools.path(), "exit 0");
    let outcome = handler(tool, StderrPolicy::ExitCode, publisher.clone())
        .handle(body.as_bytes())
        .await;

    assert_eq!(outcome, JobOutcome::Deferred);
    assert!(!outcome.should_ack());
    assert!(!tools.path().join("argv.txt").exists());
    assert!(publisher.completed.lock().unwrap().is_empty());
    assert!(publisher.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_strict_policy_reports_stderr_on_success_exit() {
    let tools = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = work.path().join("b.mp4");
    let body = json!({
        "job_id": "job-7",
        "parameters": [
            {"id": "source_paths", "value": ["/in/a.mp4"]},
            {"id": "destination_paths", "value": [output]}
        ]
    })
    .to_string();

    let publisher = Arc::new(RecordingPublisher::default());
    let tool = fake_ffmpeg(tools.path(), "echo 'Past duration too large' >&2\nexit 0");
    let outcome = handler(tool, StderrPolicy::Strict, publisher.clone())
        .handle(body.as_bytes())
        .await;

    assert_eq!(outcome, JobOutcome::Failed);
    let errors = publisher.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].job_id, Some(JobId::from("job-7")));
    assert_eq!(errors[0].body, body);
    assert!(errors[0].error.contains("An error occurred processing /in/a.mp4"));
    assert!(errors[0].error.contains("Past duration too large"));
    assert!(publisher.completed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_exit_code_policy_tolerates_stderr_on_success_exit() {
    let tools = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = work.path().join("b.mp4");
    let body = json!({
        "job_id": 8,
        "parameters": [
            {"id": "source_paths", "value": ["/in/a.mp4"]},
            {"id": "destination_paths", "value": [output]}
        ]
    })
    .to_string();

    let publisher = Arc::new(RecordingPublisher::default());
    let tool = fake_ffmpeg(tools.path(), "echo 'Past duration too large' >&2\nexit 0");
    let outcome = handler(tool, StderrPolicy::ExitCode, publisher.clone())
        .handle(body.as_bytes())
        .await;

    assert_eq!(outcome, JobOutcome::Completed);
    assert_eq!(recorded_argv(tools.path()).last().map(String::as_str), output.to_str());
    assert_eq!(
        recorded_argv(tools.path()).iter().filter(|a| a.as_str() == "-n").count(),
        1
    );
}

#[tokio::test]
async fn test_non_zero_exit_reports_code_and_stdout() {
    let tools = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let body = json!({
        "job_id": 9,
        "parameters": [
            {"id": "source_paths", "value": ["/in/a.mp4"]},
            {"id": "destination_paths", "value": [work.path().join("b.mp4")]}
        ]
    })
    .to_string();

    let publisher = Arc::new(RecordingPublisher::default());
    let tool = fake_ffmpeg(tools.path(), "echo 'Conversion failed!'\nexit 1");
    let outcome = handler(tool, StderrPolicy::ExitCode, publisher.clone())
        .handle(body.as_bytes())
        .await;

    assert_eq!(outcome, JobOutcome::Failed);
    let errors = publisher.errors.lock().unwrap();
    assert!(errors[0]
        .error
        .starts_with("Process returned with error (code: 1):\nConversion failed!"));
}

#[tokio::test]
async fn test_job_without_destinations_never_launches_tool() {
    let tools = TempDir::new().unwrap();
    let body = json!({
        "job_id": 10,
        "parameters": [{"id": "source_paths", "value": ["/in/a.mp4"]}]
    })
    .to_string();

    let publisher = Arc::new(RecordingPublisher::default());
    let tool = fake_ffmpeg(tools.path(), "exit 0");
    let outcome = handler(tool, StderrPolicy::ExitCode, publisher.clone())
        .handle(body.as_bytes())
        .await;

    assert_eq!(outcome, JobOutcome::Failed);
    assert!(!tools.path().join("argv.txt").exists());
    assert!(publisher.completed.lock().unwrap().is_empty());
    let errors = publisher.errors.lock().unwrap();
    assert_eq!(errors[0].job_id, Some(JobId::Number(10)));
    assert!(errors[0].error.contains("missing destination_paths"));
}

#[tokio::test]
async fn test_malformed_json_reports_raw_body_without_job_id() {
    let tools = TempDir::new().unwrap();
    let publisher = Arc::new(RecordingPublisher::default());
    let tool = fake_ffmpeg(tools.path(), "exit 0");

    let outcome = handler(tool, StderrPolicy::ExitCode, publisher.clone())
        .handle(b"{\"job_id\": 1, \"parameters\": [")
        .await;

    assert_eq!(outcome, JobOutcome::Failed);
    let errors = publisher.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].body, "{\"job_id\": 1, \"parameters\": [");
    assert_eq!(errors[0].job_id, None);
    assert_eq!(
        serde_json::to_value(&errors[0]).unwrap().get("job_id"),
        None
    );
    assert!(!tools.path().join("argv.txt").exists());
}
