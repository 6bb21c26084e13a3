#![deny(unreachable_patterns)]
//! FFmpeg command assembly and process runner.
//!
//! This crate provides:
//! - Option translation from abstract identifiers to FFmpeg flags
//! - Argv assembly across multiple inputs and outputs
//! - Destination directory preparation
//! - Process launch, output capture and outcome classification

pub mod command;
pub mod error;
pub mod fs_utils;
pub mod options;
pub mod runner;
pub mod transcoder;

pub use command::{CommandAssembler, FfmpegCommand, OptionDiscipline, NO_OVERWRITE_FLAG, OVERWRITE_FLAG};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{prepare_output, prepare_outputs};
pub use options::{OptionTable, OptionTranslator, Scope, INPUT_OPTIONS, OUTPUT_OPTIONS};
pub use runner::{check_tool, FfmpegRunner, ProcessOutput, StderrPolicy, LIBRARY_PATH_VAR};
pub use transcoder::Transcoder;
