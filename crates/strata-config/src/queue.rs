//! Selection queue defaults.

use serde::{Deserialize, Serialize};
use strata_core::scoring::ScoreWeights;

use crate::ConfigError;

const fn default_ttl_days() -> u32 {
    7
}

const fn default_max_items() -> usize {
    20
}

const fn default_per_source_cap_fraction() -> f64 {
    0.5
}

const fn default_source_quota() -> u64 {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Days a pending item stays selectable before `expire_stale` retires it.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,

    /// Default size of a balanced selection.
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Largest share of one balanced selection a single source may take.
    #[serde(default = "default_per_source_cap_fraction")]
    pub per_source_cap_fraction: f64,

    /// Committed (selected + used) items per source before it is flagged.
    #[serde(default = "default_source_quota")]
    pub source_quota: u64,

    #[serde(default)]
    pub weights: ScoreWeights,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
            max_items: default_max_items(),
            per_source_cap_fraction: default_per_source_cap_fraction(),
            source_quota: default_source_quota(),
            weights: ScoreWeights::default(),
        }
    }
}

impl QueueConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_days == 0 {
            return Err(ConfigError::invalid("queue.ttl_days", "must be positive"));
        }
        validate_cap_fraction(self.per_source_cap_fraction)?;
        let weights = [
            ("queue.weights.synthesis", self.weights.synthesis),
            ("queue.weights.relevance", self.weights.relevance),
            ("queue.weights.uniqueness", self.weights.uniqueness),
        ];
        if let Some((field, _)) = weights
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(ConfigError::invalid(field, "must be a non-negative number"));
        }
        Ok(())
    }
}

/// Cap fractions must lie in `(0, 1]`.
pub fn validate_cap_fraction(fraction: f64) -> Result<(), ConfigError> {
    if fraction > 0.0 && fraction <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            "queue.per_source_cap_fraction",
            format!("{fraction} is outside (0, 1]"),
        ))
    }
}
