use std::path::PathBuf;

use clap::Subcommand;

/// Selection queue commands.
#[derive(Clone, Debug, Subcommand)]
pub enum QueueCommands {
    /// Enqueue rows from a JSON Lines file.
    Enqueue {
        file: PathBuf,
        /// Curator priority; replaces each row's relevance score
        #[arg(long)]
        priority: Option<f64>,
    },
    /// Enqueue items straight from the item repository.
    EnqueueItems {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        priority: Option<f64>,
    },
    /// Counts per status.
    Stats,
    /// Queue share per source.
    Distribution,
    /// Pending items with their source's committed count.
    Selectable,
    /// Preview a diversity-capped selection (nothing is changed).
    Balanced {
        /// Defaults to queue.max_items
        #[arg(long)]
        max_items: Option<usize>,
        /// Defaults to queue.per_source_cap_fraction
        #[arg(long)]
        cap_fraction: Option<f64>,
    },
    /// Move pending items to selected (all or nothing).
    Select {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Move selected items to used (all or nothing).
    MarkUsed {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        post: String,
    },
    /// Move pending items to skipped (all or nothing).
    Skip {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        reason: String,
    },
    /// Expire pending items past their expiry.
    Expire,
    /// Update scores of one item; total is recomputed.
    Scores {
        id: String,
        #[arg(long)]
        synthesis: Option<f64>,
        #[arg(long)]
        relevance: Option<f64>,
        #[arg(long)]
        uniqueness: Option<f64>,
    },
}
