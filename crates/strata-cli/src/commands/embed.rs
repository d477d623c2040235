use strata_synthesis::embedding_store;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::EmbedCommands;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `strata embed`.
pub async fn handle(
    action: &EmbedCommands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        EmbedCommands::Backfill {
            batch_size,
            max_batches,
        } => {
            let batch_size = batch_size.unwrap_or(ctx.config.embedding.batch_size);
            let max_batches = max_batches.unwrap_or(ctx.config.embedding.max_batches);
            let embedder = ctx.embedder()?;

            let spinner = Progress::spinner("embedding items without vectors");
            let result = embedding_store::backfill(
                &ctx.service,
                embedder.as_ref(),
                &ctx.config.embedding,
                batch_size,
                max_batches,
            )
            .await;

            match result {
                Ok(report) => {
                    spinner.finish_ok(&format!(
                        "{} embedded, {} skipped, {} errors",
                        report.processed, report.skipped, report.errors
                    ));
                    output(&report, flags.format)
                }
                Err(error) => {
                    spinner.finish_err("backfill failed");
                    Err(error.into())
                }
            }
        }
    }
}
