//! FFmpeg command assembly.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ffw_models::{InputSpec, JobOption, OutputSpec};

use crate::error::{MediaError, MediaResult};
use crate::options::{OptionTranslator, Scope};

/// Flag that allows FFmpeg to overwrite an existing destination.
pub const OVERWRITE_FLAG: &str = "-y";

/// Flag that makes FFmpeg refuse to overwrite an existing destination.
pub const NO_OVERWRITE_FLAG: &str = "-n";

/// How shared options are distributed over several inputs and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionDiscipline {
    /// Shared input options feed the first input, shared output options
    /// feed the first output.
    #[default]
    ConsumeOnce,
    /// Shared options are repeated for every input and every output.
    Broadcast,
}

impl OptionDiscipline {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionDiscipline::ConsumeOnce => "consume_once",
            OptionDiscipline::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for OptionDiscipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionDiscipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consume_once" => Ok(OptionDiscipline::ConsumeOnce),
            "broadcast" => Ok(OptionDiscipline::Broadcast),
            other => Err(format!("unknown option discipline: {}", other)),
        }
    }
}

/// A fully assembled FFmpeg invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegCommand {
    /// Tool executable
    program: PathBuf,
    /// Arguments after the program
    args: Vec<String>,
    /// Destinations that will be produced, in output order
    destinations: Vec<String>,
    /// Input labels for diagnostics
    inputs: Vec<String>,
}

impl FfmpegCommand {
    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Full argv, program first.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.to_string_lossy().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Space-joined command line for logs.
    pub fn command_line(&self) -> String {
        self.argv().join(" ")
    }

    /// Short tool name used to prefix process output in logs.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }
}

/// Builds FFmpeg argv from inputs, outputs and a flat option list.
#[derive(Debug, Clone)]
pub struct CommandAssembler {
    translator: OptionTranslator,
    discipline: OptionDiscipline,
}

impl CommandAssembler {
    pub fn new(translator: OptionTranslator) -> Self {
        Self {
            translator,
            discipline: OptionDiscipline::default(),
        }
    }

    pub fn with_discipline(mut self, discipline: OptionDiscipline) -> Self {
        self.discipline = discipline;
        self
    }

    /// Assemble the command for `program`.
    ///
    /// Shared options are split by scope. Each input gets its option block
    /// followed by `-i` and the input tokens. Each output gets the shared
    /// output options, then its own options, then its destination. When no
    /// output emits `-y` or `-n`, every destination is preceded by `-n`;
    /// otherwise no overwrite flag is added anywhere.
    pub fn assemble(
        &self,
        program: impl AsRef<Path>,
        inputs: &[InputSpec],
        outputs: &[OutputSpec],
        options: &[JobOption],
    ) -> MediaResult<FfmpegCommand> {
        if inputs.is_empty() {
            return Err(MediaError::NoInputs);
        }

        let (input_options, shared_output): (Vec<&JobOption>, Vec<&JobOption>) = options
            .iter()
            .partition(|opt| self.translator.scope_of(&opt.id) == Scope::Input);

        let mut args = Vec::new();

        for (index, input) in inputs.iter().enumerate() {
            if index == 0 || self.discipline == OptionDiscipline::Broadcast {
                for opt in &input_options {
                    args.extend(self.translator.tokens(Scope::Input, opt));
                }
            }
            args.push("-i".to_string());
            args.extend(input.tokens());
        }

        let blocks: Vec<Vec<String>> = outputs
            .iter()
            .enumerate()
            .map(|(index, output)| {
                let shared: &[&JobOption] = if index == 0 || self.discipline == OptionDiscipline::Broadcast {
                    shared_output.as_slice()
                } else {
                    &[]
                };
                shared
                    .iter()
                    .copied()
                    .chain(output.options.iter())
                    .flat_map(|opt| self.translator.tokens(Scope::Output, opt))
                    .collect()
            })
            .collect();

        // -y and -n are global to the invocation
        let has_overwrite_control = blocks
            .iter()
            .flatten()
            .any(|token| token.as_str() == OVERWRITE_FLAG || token.as_str() == NO_OVERWRITE_FLAG);

        let mut destinations = Vec::new();

        for (output, tokens) in outputs.iter().zip(blocks) {
            args.extend(tokens);
            if let Some(path) = &output.path {
                if !has_overwrite_control {
                    args.push(NO_OVERWRITE_FLAG.to_string());
                }
                args.push(path.clone());
                destinations.push(path.clone());
            }
        }

        Ok(FfmpegCommand {
            program: program.as_ref().to_path_buf(),
            args,
            destinations,
            inputs: inputs.iter().map(InputSpec::label).collect(),
        })
    }
}
