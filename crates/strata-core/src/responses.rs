//! Report and response types returned by Strata operations.
//!
//! Batch operations never fail as a whole for per-item problems; they
//! return one of these reports with `errors` counts instead.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::QueueItem;
use crate::enums::{QueueStatus, RunOutcome, StopReason};

/// Result of an embedding backfill.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BackfillReport {
    /// Items that received an embedding.
    pub processed: u32,
    /// Items with too little text to embed.
    pub skipped: u32,
    /// Items whose embedding call failed.
    pub errors: u32,
    /// Items still lacking an embedding after the run.
    pub remaining: u64,
}

/// Result of `enqueue` / `enqueue_from_repository`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EnqueueReport {
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
    pub inserted_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_details: Vec<String>,
}

/// Result of a JSON Lines item import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: u32,
    pub errors: u32,
    pub inserted_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_details: Vec<String>,
}

/// Result of `expire_stale`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExpireReport {
    pub expired_count: u64,
}

/// Per-status counts over the whole queue.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: u64,
    pub selected: u64,
    pub used: u64,
    pub expired: u64,
    pub skipped: u64,
    pub total: u64,
}

impl QueueStats {
    /// Build stats from `(status, count)` pairs, e.g. a `GROUP BY status` query.
    #[must_use]
    pub fn from_counts(counts: impl IntoIterator<Item = (QueueStatus, u64)>) -> Self {
        let mut stats = Self::default();
        for (status, count) in counts {
            match status {
                QueueStatus::Pending => stats.pending += count,
                QueueStatus::Selected => stats.selected += count,
                QueueStatus::Used => stats.used += count,
                QueueStatus::Expired => stats.expired += count,
                QueueStatus::Skipped => stats.skipped += count,
            }
            stats.total += count;
        }
        stats
    }
}

/// How much of the queue one source accounts for.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SourceDistribution {
    pub source_identifier: String,
    pub item_count: u64,
    pub pending_count: u64,
    pub selected_count: u64,
    pub used_count: u64,
    pub pct_of_total: f64,
}

/// A pending queue item annotated with its source's committed count.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SelectableItem {
    #[serde(flatten)]
    pub item: QueueItem,
    pub source_committed_count: u64,
    pub within_source_limit: bool,
}

/// Final summary of a synthesis run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SynthesisRunReport {
    pub digest_id: String,
    pub outcome: RunOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    /// Source items visited by Phase 1.
    pub processed: u32,
    pub candidates_created: u32,
    pub syntheses_developed: u32,
    /// Candidates skipped in Phase 2 because a synthesis already exists.
    pub already_developed: u32,
    /// Per-item and per-candidate failures, recovered locally.
    pub errors: u32,
    pub elapsed_ms: u64,
}
