//! FFmpeg worker binary.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ffw_credentials::{CredentialResolver, HttpCredentialResolver, NoCredentialBackend};
use ffw_media::{check_tool, CommandAssembler, FfmpegRunner, OptionTranslator, Transcoder};
use ffw_queue::JobQueue;
use ffw_worker::{metrics, JobExecutor, JobHandler, WorkerConfig, WorkerError, WorkerResult};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ffw=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting ffmpeg-worker");

    let config = match WorkerConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Worker config: tool={} stderr_policy={} option_discipline={} job_stream={}",
        config.tool_path().display(),
        config.stderr_policy,
        config.option_discipline,
        config.queue.job_stream
    );

    if let Err(e) = check_tool(config.tool_path()) {
        warn!("{}; jobs will fail until it is installed", e);
    }

    let executor = match build_executor(&config) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            error!("Failed to create job executor: {}", e);
            std::process::exit(1);
        }
    };

    // Setup signal handlers
    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_executor.shutdown();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}

fn build_executor(config: &WorkerConfig) -> WorkerResult<JobExecutor> {
    if let Some(addr) = config.metrics_addr {
        metrics::init_exporter(addr)?;
        info!("Metrics exporter listening on {}", addr);
    }

    let translator = OptionTranslator::standard()?;
    let assembler = CommandAssembler::new(translator).with_discipline(config.option_discipline);
    let mut runner = FfmpegRunner::new()
        .with_library_path(config.lib_path.clone())
        .with_policy(config.stderr_policy);
    if let Some(timeout) = config.ffmpeg_timeout {
        runner = runner.with_timeout(timeout.as_secs());
    }
    let transcoder = Transcoder::new(config.tool_path(), assembler, runner);

    let resolver: Arc<dyn CredentialResolver> = match &config.backend {
        Some(backend) => Arc::new(
            HttpCredentialResolver::new(backend.clone())
                .map_err(|e| WorkerError::config_error(e.to_string()))?,
        ),
        None => {
            info!("No credential backend configured; credential parameters will fail");
            Arc::new(NoCredentialBackend)
        }
    };

    let queue = Arc::new(JobQueue::new(config.queue.clone())?);
    let handler = JobHandler::new(transcoder, resolver, queue.clone());

    Ok(JobExecutor::new(queue, handler))
}
