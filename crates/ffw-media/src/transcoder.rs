//! Assemble, prepare and run in one step.

use std::path::{Path, PathBuf};
use std::time::Instant;

use ffw_models::{InputSpec, JobOption, OutputSpec};
use tracing::debug;

use crate::command::CommandAssembler;
use crate::error::MediaResult;
use crate::fs_utils::prepare_outputs;
use crate::runner::FfmpegRunner;

/// The media pipeline for one job.
#[derive(Debug, Clone)]
pub struct Transcoder {
    program: PathBuf,
    assembler: CommandAssembler,
    runner: FfmpegRunner,
}

impl Transcoder {
    pub fn new(program: impl AsRef<Path>, assembler: CommandAssembler, runner: FfmpegRunner) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            assembler,
            runner,
        }
    }

    /// Build the command, create destination directories, then run it.
    /// Returns the produced destination paths.
    pub async fn process(
        &self,
        inputs: &[InputSpec],
        outputs: &[OutputSpec],
        options: &[JobOption],
    ) -> MediaResult<Vec<String>> {
        let cmd = self.assembler.assemble(&self.program, inputs, outputs, options)?;
        prepare_outputs(cmd.destinations()).await?;

        let started = Instant::now();
        let produced = self.runner.run(&cmd).await;
        debug!(
            "{} finished in {:.3}s",
            cmd.tool_name(),
            started.elapsed().as_secs_f64()
        );
        produced
    }
}
