//! Command implementations.

pub mod analyze;
pub mod classify;
pub mod config;
pub mod records;
pub mod serve;
pub mod video;

use clap::ValueEnum;
use glowworm_core::OutputFormat;

/// `--format` values shared by the commands that print records.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// Pretty JSON (an array for lists)
    Json,
    /// One JSON object per line
    Jsonl,
    /// One readable line per record
    Summary,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Jsonl => OutputFormat::JsonLines,
            FormatArg::Summary => OutputFormat::Summary,
        }
    }
}
