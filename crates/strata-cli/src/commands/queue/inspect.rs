use serde::Serialize;
use strata_core::selection::source_cap;

use super::view::{QueueRow, SelectableRow, rows};
use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Preview of a balanced selection. Nothing in the queue changes.
#[derive(Debug, Serialize)]
struct BalancedResponse {
    max_items: usize,
    cap_fraction: f64,
    per_source_cap: usize,
    items: Vec<QueueRow>,
}

pub async fn stats(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let stats = ctx.service.queue_stats().await?;
    output(&stats, flags.format)
}

pub async fn distribution(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let distribution = ctx.service.source_distribution().await?;
    output(&distribution, flags.format)
}

pub async fn selectable(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let items = ctx
        .service
        .selectable_items(ctx.config.queue.source_quota)
        .await?
        .into_iter()
        .map(SelectableRow::from)
        .collect::<Vec<_>>();
    output(&items, flags.format)
}

pub async fn balanced(
    max_items: Option<usize>,
    cap_fraction: Option<f64>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let max_items = max_items.unwrap_or(ctx.config.queue.max_items);
    let cap_fraction = cap_fraction.unwrap_or(ctx.config.queue.per_source_cap_fraction);
    let items = ctx
        .service
        .balanced_selection(max_items, cap_fraction)
        .await?;

    output(
        &BalancedResponse {
            max_items,
            cap_fraction,
            per_source_cap: source_cap(max_items, cap_fraction),
            items: rows(items),
        },
        flags.format,
    )
}
