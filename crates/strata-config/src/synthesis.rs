//! Synthesis pipeline defaults: similarity search, scoring and development.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_core_thesis() -> String {
    "Technology shifts compound slowly and then all at once; durable advantage \
     comes from infrastructure, distribution and trust rather than novelty."
        .to_string()
}

fn default_development_prompt() -> String {
    "You are an editor connecting today's news to the historical record. \
     Write a short, concrete synthesis that explains how the earlier item \
     illuminates the new one. Prefer specific facts over generalities."
        .to_string()
}

const fn default_min_similarity() -> f64 {
    0.6
}

const fn default_max_age_days() -> u32 {
    90
}

const fn default_max_results() -> usize {
    5
}

const fn default_max_items_to_process() -> usize {
    10
}

const fn default_max_candidates_per_item() -> usize {
    3
}

const fn default_scoring_concurrency() -> usize {
    3
}

const fn default_scoring_batch_delay_ms() -> u64 {
    1000
}

const fn default_scoring_max_tokens() -> u32 {
    512
}

const fn default_scoring_timeout_secs() -> u64 {
    15
}

const fn default_development_max_tokens() -> u32 {
    2048
}

const fn default_development_timeout_secs() -> u64 {
    18
}

const fn default_run_budget_secs() -> u64 {
    270
}

const fn default_heartbeat_interval_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SynthesisConfig {
    /// Editorial thesis candidates are scored and developed against.
    #[serde(default = "default_core_thesis")]
    pub core_thesis: String,

    /// Instructions prepended to every development request.
    #[serde(default = "default_development_prompt")]
    pub development_prompt: String,

    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,

    /// Neighbors returned per similarity query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_max_items_to_process")]
    pub max_items_to_process: usize,

    #[serde(default = "default_max_candidates_per_item")]
    pub max_candidates_per_item: usize,

    /// Scoring calls in flight at once.
    #[serde(default = "default_scoring_concurrency")]
    pub scoring_concurrency: usize,

    #[serde(default = "default_scoring_batch_delay_ms")]
    pub scoring_batch_delay_ms: u64,

    #[serde(default = "default_scoring_max_tokens")]
    pub scoring_max_tokens: u32,

    /// Hard limit for one scoring call.
    #[serde(default = "default_scoring_timeout_secs")]
    pub scoring_timeout_secs: u64,

    #[serde(default = "default_development_max_tokens")]
    pub development_max_tokens: u32,

    /// Hard limit for one development call.
    #[serde(default = "default_development_timeout_secs")]
    pub development_timeout_secs: u64,

    /// Wall-clock budget for a whole run; checked between items.
    #[serde(default = "default_run_budget_secs")]
    pub run_budget_secs: u64,

    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            core_thesis: default_core_thesis(),
            development_prompt: default_development_prompt(),
            min_similarity: default_min_similarity(),
            max_age_days: default_max_age_days(),
            max_results: default_max_results(),
            max_items_to_process: default_max_items_to_process(),
            max_candidates_per_item: default_max_candidates_per_item(),
            scoring_concurrency: default_scoring_concurrency(),
            scoring_batch_delay_ms: default_scoring_batch_delay_ms(),
            scoring_max_tokens: default_scoring_max_tokens(),
            scoring_timeout_secs: default_scoring_timeout_secs(),
            development_max_tokens: default_development_max_tokens(),
            development_timeout_secs: default_development_timeout_secs(),
            run_budget_secs: default_run_budget_secs(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
        }
    }
}

impl SynthesisConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(-1.0..=1.0).contains(&self.min_similarity) {
            return Err(ConfigError::invalid(
                "synthesis.min_similarity",
                "must be within [-1, 1]",
            ));
        }
        let positive = [
            ("synthesis.max_results", self.max_results),
            ("synthesis.scoring_concurrency", self.scoring_concurrency),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::invalid(field, "must be positive"));
        }
        let positive_secs = [
            ("synthesis.scoring_timeout_secs", self.scoring_timeout_secs),
            (
                "synthesis.development_timeout_secs",
                self.development_timeout_secs,
            ),
            ("synthesis.run_budget_secs", self.run_budget_secs),
            (
                "synthesis.heartbeat_interval_secs",
                self.heartbeat_interval_secs,
            ),
        ];
        if let Some((field, _)) = positive_secs.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::invalid(field, "must be positive"));
        }
        if self.core_thesis.trim().is_empty() {
            return Err(ConfigError::invalid("synthesis.core_thesis", "must not be blank"));
        }
        Ok(())
    }
}
