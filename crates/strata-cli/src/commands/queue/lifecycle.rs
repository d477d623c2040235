use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;
use strata_db::updates::queue::{ScoreUpdate, ScoreUpdateBuilder};

use super::view::{QueueRow, rows};
use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct TransitionResponse<'a> {
    status: &'static str,
    count: usize,
    ids: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Pending → selected, all or nothing.
pub async fn select(ids: &[String], ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let selected = ctx.service.select_for_article(ids).await?;
    output(&rows(selected), flags.format)
}

/// Selected → used, all or nothing.
pub async fn mark_used(
    ids: &[String],
    post_id: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    ctx.service.mark_used(ids, post_id).await?;
    let moved = distinct(ids);
    output(
        &TransitionResponse {
            status: "used",
            count: moved.len(),
            ids: moved,
            post_id: Some(post_id),
            reason: None,
        },
        flags.format,
    )
}

/// Pending → skipped, all or nothing.
pub async fn skip(
    ids: &[String],
    reason: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    ctx.service.skip(ids, reason).await?;
    let moved = distinct(ids);
    output(
        &TransitionResponse {
            status: "skipped",
            count: moved.len(),
            ids: moved,
            post_id: None,
            reason: Some(reason),
        },
        flags.format,
    )
}

pub async fn expire(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = ctx.service.expire_stale(Utc::now()).await?;
    output(&report, flags.format)
}

pub async fn scores(
    id: &str,
    synthesis: Option<f64>,
    relevance: Option<f64>,
    uniqueness: Option<f64>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let update = score_update(synthesis, relevance, uniqueness);
    let item = ctx
        .service
        .update_scores(id, update, &ctx.config.queue.weights)
        .await?;
    output(&QueueRow::from(item), flags.format)
}

/// IDs in first-seen order without repeats; the service ignores duplicates.
fn distinct(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn score_update(
    synthesis: Option<f64>,
    relevance: Option<f64>,
    uniqueness: Option<f64>,
) -> ScoreUpdate {
    let mut builder = ScoreUpdateBuilder::new();
    if let Some(score) = synthesis {
        builder = builder.synthesis(score);
    }
    if let Some(score) = relevance {
        builder = builder.relevance(score);
    }
    if let Some(score) = uniqueness {
        builder = builder.uniqueness(score);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::{distinct, score_update};

    #[test]
    fn only_given_scores_are_set() {
        let update = score_update(None, Some(4.0), None);
        assert_eq!(update.synthesis_score, None);
        assert_eq!(update.relevance_score, Some(4.0));
        assert_eq!(update.uniqueness_score, None);
    }

    #[test]
    fn repeated_ids_are_counted_once() {
        let ids = ["que-1", "que-2", "que-1"].map(String::from);
        assert_eq!(distinct(&ids), vec!["que-1", "que-2"]);
    }

    #[test]
    fn no_flags_is_an_empty_update() {
        assert!(score_update(None, None, None).is_empty());
    }
}
