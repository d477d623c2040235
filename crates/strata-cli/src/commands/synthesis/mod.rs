mod list;
mod run;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SynthesisCommands;
use crate::context::AppContext;

/// Handle `strata synthesis`.
pub async fn handle(
    action: &SynthesisCommands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SynthesisCommands::Run(args) => run::run(args, ctx, flags).await,
        SynthesisCommands::List { digest_id } => list::syntheses(digest_id, ctx, flags).await,
        SynthesisCommands::Candidates { digest_id } => {
            list::candidates(digest_id, ctx, flags).await
        }
    }
}
