//! Embedding backfill tuning.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_batch_size() -> u32 {
    50
}

const fn default_max_batches() -> u32 {
    10
}

const fn default_delay_ms() -> u64 {
    100
}

const fn default_content_char_limit() -> usize {
    2000
}

const fn default_min_text_chars() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Items fetched per backfill batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Batches per backfill run.
    #[serde(default = "default_max_batches")]
    pub max_batches: u32,

    /// Pause between embedding calls, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Content characters appended to the title before embedding.
    #[serde(default = "default_content_char_limit")]
    pub content_char_limit: usize,

    /// Texts shorter than this are skipped rather than embedded.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_batches: default_max_batches(),
            delay_ms: default_delay_ms(),
            content_char_limit: default_content_char_limit(),
            min_text_chars: default_min_text_chars(),
        }
    }
}

impl EmbeddingConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("embedding.batch_size", "must be positive"));
        }
        if self.max_batches == 0 {
            return Err(ConfigError::invalid("embedding.max_batches", "must be positive"));
        }
        if self.content_char_limit == 0 {
            return Err(ConfigError::invalid(
                "embedding.content_char_limit",
                "must be positive",
            ));
        }
        Ok(())
    }
}
