use chrono::NaiveDate;
use clap::Subcommand;

/// Digest anchor commands.
#[derive(Clone, Debug, Subcommand)]
pub enum DigestCommands {
    /// Get or create the digest for a date (YYYY-MM-DD).
    Open { date: NaiveDate },
    /// Get a digest by ID.
    Get { id: String },
}
