//! Queue score update builder.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct ScoreUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniqueness_score: Option<f64>,
}

impl ScoreUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.synthesis_score.is_none()
            && self.relevance_score.is_none()
            && self.uniqueness_score.is_none()
    }
}

#[derive(Default)]
pub struct ScoreUpdateBuilder(ScoreUpdate);

impl ScoreUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ScoreUpdate::default())
    }

    #[must_use]
    pub const fn synthesis(mut self, score: f64) -> Self {
        self.0.synthesis_score = Some(score);
        self
    }

    #[must_use]
    pub const fn relevance(mut self, score: f64) -> Self {
        self.0.relevance_score = Some(score);
        self
    }

    #[must_use]
    pub const fn uniqueness(mut self, score: f64) -> Self {
        self.0.uniqueness_score = Some(score);
        self
    }

    #[must_use]
    pub const fn build(self) -> ScoreUpdate {
        self.0
    }
}
