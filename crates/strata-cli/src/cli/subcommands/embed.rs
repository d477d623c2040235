use clap::Subcommand;

/// Embedding store commands.
#[derive(Clone, Debug, Subcommand)]
pub enum EmbedCommands {
    /// Embed items that have no vector yet.
    Backfill {
        /// Items per batch (defaults to embedding.batch_size)
        #[arg(long)]
        batch_size: Option<u32>,
        /// Batches to run (defaults to embedding.max_batches)
        #[arg(long)]
        max_batches: Option<u32>,
    },
}
