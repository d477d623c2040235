use chrono::{DateTime, Utc};
use serde::Serialize;
use strata_core::entities::QueueItem;
use strata_core::enums::QueueStatus;
use strata_core::responses::SelectableItem;

/// Queue row without the full content, for listings.
#[derive(Debug, Serialize)]
pub struct QueueRow {
    pub id: String,
    pub title: String,
    pub source_identifier: String,
    pub status: QueueStatus,
    pub total_score: f64,
    pub synthesis_score: f64,
    pub relevance_score: f64,
    pub uniqueness_score: f64,
    pub queued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_in_post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl From<QueueItem> for QueueRow {
    fn from(item: QueueItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            source_identifier: item.source_identifier,
            status: item.status,
            total_score: item.total_score,
            synthesis_score: item.synthesis_score,
            relevance_score: item.relevance_score,
            uniqueness_score: item.uniqueness_score,
            queued_at: item.queued_at,
            expires_at: item.expires_at,
            used_in_post_id: item.used_in_post_id,
            skip_reason: item.skip_reason,
        }
    }
}

/// Pending row annotated with its source's committed count.
#[derive(Debug, Serialize)]
pub struct SelectableRow {
    #[serde(flatten)]
    pub row: QueueRow,
    pub source_committed_count: u64,
    pub within_source_limit: bool,
}

impl From<SelectableItem> for SelectableRow {
    fn from(selectable: SelectableItem) -> Self {
        Self {
            row: QueueRow::from(selectable.item),
            source_committed_count: selectable.source_committed_count,
            within_source_limit: selectable.within_source_limit,
        }
    }
}

#[must_use]
pub fn rows(items: Vec<QueueItem>) -> Vec<QueueRow> {
    items.into_iter().map(QueueRow::from).collect()
}
