//! FFmpeg process runner.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};

/// Environment variable overridden with the configured library path.
pub const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// How a finished process is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StderrPolicy {
    /// Any stderr output is a failure, even on a zero exit.
    Strict,
    /// Only a non-zero exit is a failure; stderr is diagnostic context.
    #[default]
    ExitCode,
}

impl StderrPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StderrPolicy::Strict => "strict",
            StderrPolicy::ExitCode => "exit_code",
        }
    }
}

impl fmt::Display for StderrPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StderrPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(StderrPolicy::Strict),
            "exit_code" => Ok(StderrPolicy::ExitCode),
            other => Err(format!("unknown stderr policy: {}", other)),
        }
    }
}

/// Captured result of one invocation.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs assembled commands and classifies their outcome.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Value for [`LIBRARY_PATH_VAR`] in the child environment
    library_path: Option<String>,
    policy: StderrPolicy,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library_path(mut self, path: impl Into<String>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_policy(mut self, policy: StderrPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run a command and return the destinations it produced.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<Vec<String>> {
        let output = self.execute(cmd).await?;
        let result = self.classify(cmd, &output);
        log_output(&cmd.tool_name(), &output, result.is_err());
        result.map(|()| cmd.destinations().to_vec())
    }

    /// Launch the process and capture stdout and stderr separately.
    pub async fn execute(&self, cmd: &FfmpegCommand) -> MediaResult<ProcessOutput> {
        info!("Launching process command: {}", cmd.command_line());

        let mut command = Command::new(cmd.program());
        command
            .args(cmd.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(library_path) = &self.library_path {
            command.env(LIBRARY_PATH_VAR, library_path);
        }

        let child = command.spawn().map_err(|source| MediaError::SpawnFailed {
            program: cmd.program().to_path_buf(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let wait = child.wait_with_output();
        let output = match self.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), wait).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!("{} timed out after {} seconds, killing process", cmd.tool_name(), secs);
                    return Err(MediaError::Timeout(secs));
                }
            },
            None => wait.await?,
        };

        Ok(ProcessOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }

    /// Apply the stderr policy to a finished run.
    pub fn classify(&self, cmd: &FfmpegCommand, output: &ProcessOutput) -> MediaResult<()> {
        let stderr = output.stderr_text();

        if self.policy == StderrPolicy::Strict && !stderr.is_empty() {
            return Err(MediaError::process_failed(
                format!("An error occurred processing {}: {}", cmd.inputs().join(", "), stderr),
                Some(stderr),
                output.exit_code,
            ));
        }

        if output.success() {
            return Ok(());
        }

        let code = output
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let mut message = format!("Process returned with error (code: {}):\n{}", code, output.stdout_text());
        if self.policy == StderrPolicy::ExitCode && !stderr.is_empty() {
            message.push('\n');
            message.push_str(&stderr);
        }

        Err(MediaError::process_failed(
            message,
            (!stderr.is_empty()).then_some(stderr),
            output.exit_code,
        ))
    }
}

fn log_output(tool: &str, output: &ProcessOutput, failed: bool) {
    for line in output.stdout_text().lines() {
        info!("[{}] {}", tool, line);
    }
    for line in output.stderr_text().lines() {
        if failed {
            error!("[{}] {}", tool, line);
        } else {
            warn!("[{}] {}", tool, line);
        }
    }
}

/// Check that the tool can be launched: an existing file, or a name on `PATH`.
pub fn check_tool(program: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let program = program.as_ref();
    if program.components().count() > 1 {
        if program.is_file() {
            return Ok(program.to_path_buf());
        }
        return Err(MediaError::ToolNotFound(program.to_path_buf()));
    }
    which::which(program).map_err(|_| MediaError::ToolNotFound(program.to_path_buf()))
}
