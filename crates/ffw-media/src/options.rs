//! Translation of abstract option identifiers into FFmpeg flags.

use std::collections::HashMap;
use std::fmt;

use ffw_models::JobOption;

use crate::error::{MediaError, MediaResult};

/// Options placed before an input's `-i`.
pub const INPUT_OPTIONS: &[(&str, &str)] = &[
    ("input_codec_audio", "-codec:a"),
    ("input_codec_video", "-codec:v"),
];

/// Options placed before an output's destination.
pub const OUTPUT_OPTIONS: &[(&str, &str)] = &[
    ("output_codec_audio", "-codec:a"),
    ("output_codec_video", "-codec:v"),
    ("force_overwrite", "-y"),
    ("never_overwrite", "-n"),
    ("disable_video", "-vn"),
    ("disable_audio", "-an"),
    ("disable_data", "-dn"),
    ("profile_audio", "-profile:a"),
    ("profile_video", "-profile:v"),
    ("audio_sampling_rate", "-ar"),
    ("audio_channels", "-ac"),
    ("variable_bitrate", "-vbr"),
    ("audio_filters", "-af"),
    ("video_filters", "-vf"),
    ("max_bitrate", "-maxrate"),
    ("buffer_size", "-bufsize"),
    ("preset", "-preset"),
    ("pixel_format", "-pix_fmt"),
    ("colorspace", "-colorspace"),
    ("color_trc", "-color_trc"),
    ("color_primaries", "-color_primaries"),
    ("rc_init_occupancy", "-rc_init_occupancy"),
    ("deblock", "-deblock"),
    ("write_timecode", "-write_tmcd"),
    ("x264-params", "-x264-params"),
];

/// Where an option lands in the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Input,
    Output,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Input => write!(f, "input"),
            Scope::Output => write!(f, "output"),
        }
    }
}

/// Immutable identifier-to-flag map for one scope.
#[derive(Debug, Clone)]
pub struct OptionTable {
    flags: HashMap<String, String>,
}

impl OptionTable {
    /// Build a table from `(identifier, flag)` pairs, rejecting duplicates.
    pub fn from_pairs(scope: Scope, pairs: &[(&str, &str)]) -> MediaResult<Self> {
        let mut flags = HashMap::with_capacity(pairs.len());
        for (id, flag) in pairs {
            if flags.insert(id.to_string(), flag.to_string()).is_some() {
                return Err(MediaError::DuplicateOption {
                    scope,
                    id: id.to_string(),
                });
            }
        }
        Ok(Self { flags })
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.flags.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.flags.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Maps `(identifier, value)` options to argv tokens.
///
/// Identifiers registered in the input table are input-scoped. Everything
/// else, including unknown identifiers, is output-scoped. Unknown
/// identifiers translate to `-<identifier>`.
#[derive(Debug, Clone)]
pub struct OptionTranslator {
    input: OptionTable,
    output: OptionTable,
}

impl OptionTranslator {
    /// Translator over the built-in FFmpeg tables.
    pub fn standard() -> MediaResult<Self> {
        Self::from_pairs(INPUT_OPTIONS, OUTPUT_OPTIONS)
    }

    pub fn from_pairs(input: &[(&str, &str)], output: &[(&str, &str)]) -> MediaResult<Self> {
        Self::new(
            OptionTable::from_pairs(Scope::Input, input)?,
            OptionTable::from_pairs(Scope::Output, output)?,
        )
    }

    /// Combine two tables. An identifier may only be owned by one scope.
    pub fn new(input: OptionTable, output: OptionTable) -> MediaResult<Self> {
        if let Some(id) = input.flags.keys().find(|id| output.contains(id)) {
            return Err(MediaError::AmbiguousScope(id.clone()));
        }
        Ok(Self { input, output })
    }

    /// Scope an identifier belongs to.
    pub fn scope_of(&self, id: &str) -> Scope {
        if self.input.contains(id) {
            Scope::Input
        } else {
            Scope::Output
        }
    }

    /// Flag for an identifier in the given scope.
    pub fn flag(&self, scope: Scope, id: &str) -> String {
        let table = match scope {
            Scope::Input => &self.input,
            Scope::Output => &self.output,
        };
        table
            .get(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("-{}", id))
    }

    /// Argv tokens for one option: none, the flag, or the flag and its argument.
    pub fn tokens(&self, scope: Scope, option: &JobOption) -> Vec<String> {
        if option.value.is_disabled() {
            return Vec::new();
        }
        let mut tokens = vec![self.flag(scope, &option.id)];
        if let Some(argument) = option.value.argument() {
            tokens.push(argument);
        }
        tokens
    }
}
