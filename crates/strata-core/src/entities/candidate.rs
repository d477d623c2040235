use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::SynthesisType;
use crate::scoring::candidate_score;

/// A scored (source, related) item pair proposed as a cross-temporal
/// connection. Written once per pair per digest, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SynthesisCandidate {
    pub id: String,
    pub digest_id: String,
    pub source_item_id: String,
    pub related_item_id: String,
    pub similarity: f64,
    pub synthesis_type: SynthesisType,
    pub originality_score: u8,
    pub relevance_score: u8,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
}

impl SynthesisCandidate {
    /// `originality + relevance`, the key used to pick which candidate to develop.
    #[must_use]
    pub fn combined_score(&self) -> u16 {
        candidate_score(self.originality_score, self.relevance_score)
    }
}

/// A scored candidate before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCandidate {
    pub digest_id: String,
    pub source_item_id: String,
    pub related_item_id: String,
    pub similarity: f64,
    pub synthesis_type: SynthesisType,
    pub originality_score: u8,
    pub relevance_score: u8,
    pub reasoning: String,
}
