mod enqueue;
mod inspect;
mod lifecycle;
mod view;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::QueueCommands;
use crate::context::AppContext;

/// Handle `strata queue`.
pub async fn handle(
    action: &QueueCommands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        QueueCommands::Enqueue { file, priority } => {
            enqueue::from_file(file, *priority, ctx, flags).await
        }
        QueueCommands::EnqueueItems { ids, priority } => {
            enqueue::from_items(ids, *priority, ctx, flags).await
        }
        QueueCommands::Stats => inspect::stats(ctx, flags).await,
        QueueCommands::Distribution => inspect::distribution(ctx, flags).await,
        QueueCommands::Selectable => inspect::selectable(ctx, flags).await,
        QueueCommands::Balanced {
            max_items,
            cap_fraction,
        } => inspect::balanced(*max_items, *cap_fraction, ctx, flags).await,
        QueueCommands::Select { ids } => lifecycle::select(ids, ctx, flags).await,
        QueueCommands::MarkUsed { ids, post } => lifecycle::mark_used(ids, post, ctx, flags).await,
        QueueCommands::Skip { ids, reason } => lifecycle::skip(ids, reason, ctx, flags).await,
        QueueCommands::Expire => lifecycle::expire(ctx, flags).await,
        QueueCommands::Scores {
            id,
            synthesis,
            relevance,
            uniqueness,
        } => lifecycle::scores(id, *synthesis, *relevance, *uniqueness, ctx, flags).await,
    }
}
