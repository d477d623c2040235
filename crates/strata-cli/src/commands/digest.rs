use crate::cli::GlobalFlags;
use crate::cli::subcommands::DigestCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `strata digest`.
pub async fn handle(
    action: &DigestCommands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let digest = match action {
        DigestCommands::Open { date } => ctx.service.get_or_create_digest(*date).await?,
        DigestCommands::Get { id } => ctx.service.get_digest(id).await?,
    };
    output(&digest, flags.format)
}
