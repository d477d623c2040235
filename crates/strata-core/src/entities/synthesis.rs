use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Narrative expansion of a chosen candidate. At most one per candidate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DevelopedSynthesis {
    pub id: String,
    pub digest_id: String,
    pub candidate_id: String,
    pub headline: String,
    pub content: String,
    pub historical_reference: String,
    pub core_thesis_alignment: String,
    pub created_at: DateTime<Utc>,
}

/// The fields a development call must produce.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SynthesisDraft {
    pub headline: String,
    pub content: String,
    pub historical_reference: String,
    pub core_thesis_alignment: String,
}

impl SynthesisDraft {
    /// Names of required fields that came back blank.
    #[must_use]
    pub fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("headline", &self.headline),
            ("content", &self.content),
            ("historical_reference", &self.historical_reference),
            ("core_thesis_alignment", &self.core_thesis_alignment),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}
