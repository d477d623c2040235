//! Pure scoring functions shared by the synthesis pipeline and the queue.
//!
//! Nothing here reads clocks, configuration files or the database: every
//! score is a function of its arguments only.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bound of model-assigned originality and relevance scores.
pub const MAX_MODEL_SCORE: u8 = 10;

/// Combined score of a synthesis candidate: `originality + relevance`.
#[must_use]
pub fn candidate_score(originality: u8, relevance: u8) -> u16 {
    u16::from(originality) + u16::from(relevance)
}

/// Clamp a raw model score into `0..=MAX_MODEL_SCORE`.
#[must_use]
pub fn clamp_model_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    let rounded = raw.round().clamp(0.0, f64::from(MAX_MODEL_SCORE));
    // In range after the clamp above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = rounded as u8;
    score
}

/// Weights applied to the three queue scores when deriving `total_score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreWeights {
    #[serde(default = "unit_weight")]
    pub synthesis: f64,
    #[serde(default = "unit_weight")]
    pub relevance: f64,
    #[serde(default = "unit_weight")]
    pub uniqueness: f64,
}

const fn unit_weight() -> f64 {
    1.0
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            synthesis: unit_weight(),
            relevance: unit_weight(),
            uniqueness: unit_weight(),
        }
    }
}

impl ScoreWeights {
    /// Weighted sum of the three queue scores.
    #[must_use]
    pub fn total(&self, synthesis: f64, relevance: f64, uniqueness: f64) -> f64 {
        self.uniqueness.mul_add(
            uniqueness,
            self.synthesis.mul_add(synthesis, self.relevance * relevance),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn candidate_score_is_sum() {
        assert_eq!(candidate_score(7, 8), 15);
        assert_eq!(candidate_score(7, 8), candidate_score(7, 8));
    }

    #[test]
    fn candidate_score_does_not_overflow() {
        assert_eq!(candidate_score(u8::MAX, u8::MAX), 510);
    }

    #[rstest]
    #[case(-3.0, 0)]
    #[case(0.4, 0)]
    #[case(6.6, 7)]
    #[case(10.0, 10)]
    #[case(42.0, 10)]
    #[case(f64::NAN, 0)]
    fn clamp_model_score_cases(#[case] raw: f64, #[case] expected: u8) {
        assert_eq!(clamp_model_score(raw), expected);
    }

    #[test]
    fn default_weights_sum_scores() {
        let weights = ScoreWeights::default();
        assert!((weights.total(7.0, 8.0, 0.0) - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn custom_weights_apply() {
        let weights = ScoreWeights {
            synthesis: 0.5,
            relevance: 2.0,
            uniqueness: 0.0,
        };
        assert!((weights.total(4.0, 3.0, 100.0) - 8.0).abs() < 1e-9);
    }
}
