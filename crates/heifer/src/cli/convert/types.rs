//! CLI enum types for the convert command.

use clap::ValueEnum;
use heifer_core::{CollisionPolicy, ReportFormat};

/// Report file formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormatArg {
    /// Single JSON document
    #[default]
    Json,
    /// One JSON object per line, summary last
    Jsonl,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Json => ReportFormat::Json,
            ReportFormatArg::Jsonl => ReportFormat::JsonLines,
        }
    }
}

/// How per-file progress is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ProgressMode {
    /// One log line per file
    #[default]
    Log,
    /// Interactive progress bar
    Bar,
}

/// Output-name collision handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CollisionArg {
    /// Abort before converting anything
    Fail,
    /// Name colliding outputs `<stem>_<ext>.jpg`
    KeepExtension,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(arg: CollisionArg) -> Self {
        match arg {
            CollisionArg::Fail => CollisionPolicy::Fail,
            CollisionArg::KeepExtension => CollisionPolicy::KeepExtension,
        }
    }
}
