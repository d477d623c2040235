use std::path::PathBuf;

use clap::ValueEnum;

/// Output format for CLI responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Aligned text table
    Table,
    /// Single-line JSON
    Raw,
}

/// Flags shared by every command handler.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub config: Option<PathBuf>,
}
