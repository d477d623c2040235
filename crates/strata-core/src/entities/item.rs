use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A dated text item (newsletter issue, extracted article) from the ingestion
/// collaborator. Only the embedding is ever written by Strata.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source_identifier: String,
    pub source_url: Option<String>,
    pub collected_at: DateTime<Utc>,
    /// Logical day bucket the item was published under.
    pub newsletter_date: NaiveDate,
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
}

impl Item {
    #[must_use]
    pub const fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Input shape for inserting an item (one JSON object per line on import).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewItem {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub source_identifier: String,
    #[serde(default)]
    pub source_url: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub newsletter_date: NaiveDate,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// The slice of an item the similarity index needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedItem {
    pub id: String,
    pub collected_at: DateTime<Utc>,
    pub newsletter_date: NaiveDate,
    pub embedding: Vec<f32>,
}
