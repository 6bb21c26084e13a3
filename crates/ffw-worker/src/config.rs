//! Worker configuration.
//!
//! Every setting is looked up as an environment variable first, then as a
//! `section.key` entry in the INI files `worker.cfg` and
//! `/etc/ffmpeg_worker/worker.cfg`. Configuration is loaded once at startup
//! and validated before the worker touches the queue.

use std::collections::HashMap;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, File, FileFormat};

use ffw_credentials::BackendConfig;
use ffw_media::{OptionDiscipline, StderrPolicy};
use ffw_queue::QueueConfig;

use crate::error::{WorkerError, WorkerResult};

/// Configuration files, in lookup order.
pub const CONFIG_FILES: &[&str] = &["worker.cfg", "/etc/ffmpeg_worker/worker.cfg"];

/// Executable name inside the configured bin directory.
pub const TOOL_NAME: &str = "ffmpeg";

/// Environment variables over INI file entries.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    env: HashMap<String, String>,
    file: Config,
}

impl ConfigSource {
    /// Read the process environment and the optional configuration files.
    pub fn load() -> WorkerResult<Self> {
        let mut builder = Config::builder();
        for path in CONFIG_FILES {
            builder = builder.add_source(File::new(path, FileFormat::Ini).required(false));
        }
        let file = builder
            .build()
            .map_err(|e| WorkerError::config_error(e.to_string()))?;

        Ok(Self::new(std::env::vars().collect(), file))
    }

    pub fn new(env: HashMap<String, String>, file: Config) -> Self {
        Self { env, file }
    }

    /// Value for `env_var`, falling back to `key`. Empty values count as unset.
    pub fn get(&self, env_var: &str, key: &str) -> WorkerResult<Option<String>> {
        if let Some(value) = self.env.get(env_var).filter(|v| !v.trim().is_empty()) {
            return Ok(Some(value.trim().to_string()));
        }
        match self.file.get_string(key) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(value.trim().to_string())),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(WorkerError::config_error(format!("{}: {}", key, e))),
        }
    }

    pub fn require(&self, env_var: &str, key: &str) -> WorkerResult<String> {
        self.get(env_var, key)?.ok_or_else(|| {
            WorkerError::config_error(format!("{} (or {} in the config file) must be set", env_var, key))
        })
    }

    pub fn parse<T>(&self, env_var: &str, key: &str) -> WorkerResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(env_var, key)?
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| WorkerError::config_error(format!("{}: invalid value {:?}: {}", env_var, raw, e)))
            })
            .transpose()
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory containing the ffmpeg executable
    pub bin_path: PathBuf,
    /// Shared-library search path for the child process
    pub lib_path: String,
    pub stderr_policy: StderrPolicy,
    pub option_discipline: OptionDiscipline,
    /// Process timeout; none by default
    pub ffmpeg_timeout: Option<Duration>,
    pub queue: QueueConfig,
    /// Credential backend; credential parameters fail when unset
    pub backend: Option<BackendConfig>,
    /// Prometheus listener address; exporter off when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl WorkerConfig {
    /// Load from the environment and configuration files.
    pub fn load() -> WorkerResult<Self> {
        Self::from_source(&ConfigSource::load()?)
    }

    pub fn from_source(source: &ConfigSource) -> WorkerResult<Self> {
        let defaults = QueueConfig::default();

        let queue = QueueConfig {
            redis_url: source.require("QUEUE_URL", "queue.url")?,
            job_stream: source
                .get("QUEUE_JOB_STREAM", "queue.job_stream")?
                .unwrap_or(defaults.job_stream),
            completed_stream: source
                .get("QUEUE_COMPLETED_STREAM", "queue.completed_stream")?
                .unwrap_or(defaults.completed_stream),
            error_stream: source
                .get("QUEUE_ERROR_STREAM", "queue.error_stream")?
                .unwrap_or(defaults.error_stream),
            consumer_group: source
                .get("QUEUE_CONSUMER_GROUP", "queue.consumer_group")?
                .unwrap_or(defaults.consumer_group),
            block: source
                .parse::<u64>("QUEUE_BLOCK_MS", "queue.block_ms")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.block),
            claim_min_idle: source
                .parse::<u64>("QUEUE_CLAIM_MIN_IDLE_SECS", "queue.claim_min_idle_secs")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_min_idle),
        };

        let backend = match source.get("BACKEND_HOSTNAME", "backend.hostname")? {
            Some(hostname) => Some(
                BackendConfig::new(
                    &hostname,
                    source.require("BACKEND_USERNAME", "backend.username")?,
                    source.require("BACKEND_PASSWORD", "backend.password")?,
                )
                .map_err(|e| WorkerError::config_error(e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            bin_path: PathBuf::from(source.require("FFMPEG_BIN_PATH", "ffmpeg.bin_path")?),
            lib_path: source.require("FFMPEG_LIB_PATH", "ffmpeg.lib_path")?,
            stderr_policy: source
                .parse("FFMPEG_STDERR_POLICY", "ffmpeg.stderr_policy")?
                .unwrap_or_default(),
            option_discipline: source
                .parse("FFMPEG_OPTION_DISCIPLINE", "ffmpeg.option_discipline")?
                .unwrap_or_default(),
            ffmpeg_timeout: source
                .parse::<u64>("FFMPEG_TIMEOUT_SECS", "ffmpeg.timeout_secs")?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            queue,
            backend,
            metrics_addr: source.parse("METRICS_ADDR", "metrics.addr")?,
        })
    }

    /// Full path of the ffmpeg executable.
    pub fn tool_path(&self) -> PathBuf {
        self.bin_path.join(TOOL_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(env: &[(&str, &str)], ini: &str) -> ConfigSource {
        let file = Config::builder()
            .add_source(File::from_str(ini, FileFormat::Ini))
            .build()
            .unwrap();
        ConfigSource::new(
            env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            file,
        )
    }

    const MINIMAL_INI: &str = "\
[ffmpeg]
bin_path = /opt/ffmpeg/bin
lib_path = /opt/ffmpeg/lib

[queue]
url = redis://queue:6379
";

    #[test]
    fn test_file_values_and_defaults() {
        let config = WorkerConfig::from_source(&source(&[], MINIMAL_INI)).unwrap();

        assert_eq!(config.tool_path(), PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.lib_path, "/opt/ffmpeg/lib");
        assert_eq!(config.stderr_policy, StderrPolicy::ExitCode);
        assert_eq!(config.option_discipline, OptionDiscipline::ConsumeOnce);
        assert_eq!(config.ffmpeg_timeout, None);
        assert_eq!(config.queue.redis_url, "redis://queue:6379");
        assert_eq!(config.queue.job_stream, "job_ffmpeg");
        assert_eq!(config.queue.consumer_group, "ffmpeg_workers");
        assert_eq!(config.queue.claim_min_idle, Duration::from_secs(60));
        assert!(config.backend.is_none());
        assert!(config.metrics_addr.is_none());
    }

    #[test]
    fn test_environment_wins_over_file() {
        let config = WorkerConfig::from_source(&source(
            &[
                ("FFMPEG_BIN_PATH", "/usr/local/bin"),
                ("FFMPEG_STDERR_POLICY", "strict"),
                ("FFMPEG_TIMEOUT_SECS", "600"),
                ("QUEUE_BLOCK_MS", "250"),
            ],
            MINIMAL_INI,
        ))
        .unwrap();

        assert_eq!(config.tool_path(), PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.lib_path, "/opt/ffmpeg/lib");
        assert_eq!(config.stderr_policy, StderrPolicy::Strict);
        assert_eq!(config.ffmpeg_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.queue.block, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_required_value() {
        let err = WorkerConfig::from_source(&source(&[("QUEUE_URL", "redis://q")], "")).unwrap_err();
        assert!(matches!(err, WorkerError::ConfigError(ref msg) if msg.contains("FFMPEG_BIN_PATH")));
    }

    #[test]
    fn test_invalid_enum_value() {
        let err = WorkerConfig::from_source(&source(
            &[("FFMPEG_OPTION_DISCIPLINE", "sometimes")],
            MINIMAL_INI,
        ))
        .unwrap_err();
        assert!(matches!(err, WorkerError::ConfigError(ref msg) if msg.contains("FFMPEG_OPTION_DISCIPLINE")));
    }

    #[test]
    fn test_backend_needs_account() {
        let err = WorkerConfig::from_source(&source(
            &[("BACKEND_HOSTNAME", "backend.example.com")],
            MINIMAL_INI,
        ))
        .unwrap_err();
        assert!(matches!(err, WorkerError::ConfigError(ref msg) if msg.contains("BACKEND_USERNAME")));

        let config = WorkerConfig::from_source(&source(
            &[
                ("BACKEND_HOSTNAME", "backend.example.com"),
                ("BACKEND_USERNAME", "worker@example.com"),
                ("BACKEND_PASSWORD", "hunter2"),
                ("METRICS_ADDR", "0.0.0.0:9100"),
            ],
            MINIMAL_INI,
        ))
        .unwrap();
        assert_eq!(
            config.backend.unwrap().base_url.as_str(),
            "https://backend.example.com/"
        );
        assert_eq!(config.metrics_addr, Some("0.0.0.0:9100".parse().unwrap()));
    }
}
