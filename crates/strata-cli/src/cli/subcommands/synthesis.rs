use chrono::NaiveDate;
use clap::{Args, Subcommand};

/// Synthesis pipeline commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SynthesisCommands {
    /// Run discovery and development for one digest.
    Run(SynthesisRunArgs),
    /// List developed syntheses of a digest.
    List { digest_id: String },
    /// List scored candidates of a digest.
    Candidates { digest_id: String },
}

/// Target and per-run overrides for `strata synthesis run`.
#[derive(Clone, Debug, Args)]
#[command(group(
    clap::ArgGroup::new("target")
        .required(true)
        .args(["digest", "date"])
))]
pub struct SynthesisRunArgs {
    /// Digest ID to run
    #[arg(long)]
    pub digest: Option<String>,
    /// Newsletter date (YYYY-MM-DD); the digest is opened if missing
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Today's items to visit, at most
    #[arg(long)]
    pub max_items: Option<usize>,
    /// Candidates scored per item, at most
    #[arg(long)]
    pub max_candidates: Option<usize>,
    /// Minimum cosine similarity for a neighbor
    #[arg(long)]
    pub min_similarity: Option<f64>,
    /// How far back neighbors may be, in days
    #[arg(long)]
    pub max_age_days: Option<u32>,
    /// Print every progress event as a JSON line instead of a progress bar
    #[arg(long)]
    pub stream: bool,
}
