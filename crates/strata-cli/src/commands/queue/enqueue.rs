use std::path::Path;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// `strata queue enqueue <FILE>`: one `NewQueueItem` per JSON line.
pub async fn from_file(
    file: &Path,
    priority: Option<f64>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let report = ctx
        .service
        .enqueue_jsonl(file, priority, &ctx.queue_policy())
        .await?;
    output(&report, flags.format)
}

/// `strata queue enqueue-items <IDS>...`: copy items from the repository.
pub async fn from_items(
    ids: &[String],
    priority: Option<f64>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let report = ctx
        .service
        .enqueue_from_repository(ids, priority, &ctx.queue_policy())
        .await?;
    output(&report, flags.format)
}
