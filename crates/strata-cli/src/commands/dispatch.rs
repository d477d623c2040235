use crate::cli::{Commands, GlobalFlags};
use crate::commands;
use crate::context::AppContext;

/// Route a parsed command to its handler.
pub async fn dispatch(
    command: Commands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Item { action } => commands::item::handle(&action, ctx, flags).await,
        Commands::Embed { action } => commands::embed::handle(&action, ctx, flags).await,
        Commands::Digest { action } => commands::digest::handle(&action, ctx, flags).await,
        Commands::Synthesis { action } => commands::synthesis::handle(&action, ctx, flags).await,
        Commands::Queue { action } => commands::queue::handle(&action, ctx, flags).await,
    }
}
