//! Relationship classification for candidate pairs.
//!
//! [`ClassificationPolicy`] is the seam; [`HeuristicClassifier`] is the
//! default. It derives [`PairSignals`] from the two items and applies an
//! ordered rule list where the first match wins and the last rule always
//! matches, so every pair gets exactly one [`SynthesisType`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strata_core::entities::Item;
use strata_core::enums::SynthesisType;

/// Words that mark a stance against the prevailing narrative.
const CONTRAST_CUES: &[&str] = &[
    "however",
    "contrary",
    "reversal",
    "reversed",
    "decline",
    "declined",
    "failed",
    "failure",
    "myth",
    "debunked",
    "overturned",
];

/// Shortest term counted for overlap.
const MIN_TERM_CHARS: usize = 4;

/// Inputs to classification, derived from a (source, related) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairSignals {
    /// Whole days between the two `collected_at` instants.
    pub days_apart: i64,
    pub similarity: f64,
    /// Jaccard overlap of the two term sets, `[0, 1]`.
    pub term_overlap: f64,
    /// Exactly one side carries a contrast cue.
    pub stance_shift: bool,
    pub same_source: bool,
}

impl PairSignals {
    #[must_use]
    pub fn between(source: &Item, related: &Item, similarity: f64) -> Self {
        let source_terms = terms(&source.title, &source.content);
        let related_terms = terms(&related.title, &related.content);
        Self {
            days_apart: (source.collected_at - related.collected_at).num_days().abs(),
            similarity,
            term_overlap: jaccard(&source_terms, &related_terms),
            stance_shift: has_contrast_cue(&source_terms) != has_contrast_cue(&related_terms),
            same_source: source.source_identifier == related.source_identifier,
        }
    }
}

/// Decides the [`SynthesisType`] of a pair. Must be total and deterministic.
pub trait ClassificationPolicy: Send + Sync {
    fn classify(&self, signals: &PairSignals) -> SynthesisType;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl ClassificationPolicy for HeuristicClassifier {
    fn classify(&self, s: &PairSignals) -> SynthesisType {
        if s.stance_shift && s.similarity >= 0.5 {
            SynthesisType::Contrast
        } else if s.days_apart >= 30 && s.term_overlap >= 0.15 {
            SynthesisType::Evolution
        } else if s.term_overlap >= 0.30 {
            SynthesisType::Validation
        } else if s.term_overlap < 0.08 && !s.same_source {
            SynthesisType::CrossDomain
        } else {
            SynthesisType::Pattern
        }
    }
}

fn terms(title: &str, content: &str) -> HashSet<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .chain(content.split(|c: char| !c.is_alphanumeric()))
        .filter(|word| word.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_lowercase)
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn has_contrast_cue(terms: &HashSet<String>) -> bool {
    CONTRAST_CUES.iter().any(|cue| terms.contains(*cue))
}
