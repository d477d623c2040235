use clap::Subcommand;

use super::subcommands::{
    DigestCommands, EmbedCommands, ItemCommands, QueueCommands, SynthesisCommands,
};

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Item repository: import and inspect collected items
    Item {
        #[command(subcommand)]
        action: ItemCommands,
    },
    /// Embedding store maintenance
    Embed {
        #[command(subcommand)]
        action: EmbedCommands,
    },
    /// Digest anchors (one per newsletter date)
    Digest {
        #[command(subcommand)]
        action: DigestCommands,
    },
    /// Cross-temporal synthesis runs and their results
    Synthesis {
        #[command(subcommand)]
        action: SynthesisCommands,
    },
    /// Selection queue: enqueue, select, use, skip, expire
    Queue {
        #[command(subcommand)]
        action: QueueCommands,
    },
}
