use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::QueueStatus;

/// A scored, dated unit eligible for selection into an article.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct QueueItem {
    pub id: String,
    pub source_daily_item_id: Option<String>,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub source_identifier: String,
    pub source_url: Option<String>,
    pub synthesis_score: f64,
    pub relevance_score: f64,
    pub uniqueness_score: f64,
    /// Weighted sum of the three scores, derived on write.
    pub total_score: f64,
    pub status: QueueStatus,
    pub queued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub selected_at: Option<DateTime<Utc>>,
    pub used_in_post_id: Option<String>,
    pub skip_reason: Option<String>,
}

/// Input shape for `enqueue` (one JSON object per line on import).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewQueueItem {
    #[serde(default)]
    pub source_daily_item_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    pub source_identifier: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub synthesis_score: f64,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default)]
    pub uniqueness_score: f64,
}

impl NewQueueItem {
    /// Reason this row cannot be inserted, if any.
    #[must_use]
    pub fn rejection(&self) -> Option<String> {
        if self.title.trim().is_empty() {
            return Some("title is blank".to_string());
        }
        if self.source_identifier.trim().is_empty() {
            return Some("source_identifier is blank".to_string());
        }
        let scores = [
            ("synthesis_score", self.synthesis_score),
            ("relevance_score", self.relevance_score),
            ("uniqueness_score", self.uniqueness_score),
        ];
        scores
            .iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, value)| format!("{name} is not finite: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewQueueItem {
        NewQueueItem {
            title: "Chip export rules tighten".into(),
            source_identifier: "stratechery".into(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_row_has_no_rejection() {
        assert_eq!(valid().rejection(), None);
    }

    #[test]
    fn blank_title_rejected() {
        let row = NewQueueItem {
            title: "   ".into(),
            ..valid()
        };
        assert_eq!(row.rejection().as_deref(), Some("title is blank"));
    }

    #[test]
    fn nan_score_rejected() {
        let row = NewQueueItem {
            relevance_score: f64::NAN,
            ..valid()
        };
        assert!(row.rejection().unwrap().starts_with("relevance_score"));
    }
}
