use std::path::PathBuf;

use clap::Subcommand;

/// Item repository commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ItemCommands {
    /// Insert items from a JSON Lines file (one item per line).
    Import { file: PathBuf },
    /// Get an item by ID.
    Get { id: String },
}
