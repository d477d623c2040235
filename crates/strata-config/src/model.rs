//! Text model service configuration (embedding and generation).

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Embedding dimension every backend must produce.
pub const EMBEDDING_DIMENSIONS: usize = 768;

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_generation_model() -> String {
    "gemini-1.5-flash".to_string()
}

const fn default_dimensions() -> usize {
    EMBEDDING_DIMENSIONS
}

const fn default_request_timeout_secs() -> u64 {
    30
}

/// Where embeddings come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Hosted embedding endpoint at `base_url`.
    #[default]
    Api,
    /// In-process fastembed model (BGE-base, 768 dimensions).
    Local,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// API key for the hosted model service.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    #[serde(default)]
    pub embedding_backend: EmbeddingBackend,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Upper bound for a single HTTP request, independent of per-call timeouts.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            embedding_model: default_embedding_model(),
            generation_model: default_generation_model(),
            embedding_backend: EmbeddingBackend::default(),
            dimensions: default_dimensions(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ModelConfig {
    /// Whether the hosted service can be called.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.base_url.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.dimensions == 0 {
            return Err(ConfigError::invalid("model.dimensions", "must be positive"));
        }
        if self.embedding_backend == EmbeddingBackend::Local
            && self.dimensions != EMBEDDING_DIMENSIONS
        {
            return Err(ConfigError::invalid(
                "model.dimensions",
                format!("local backend produces {EMBEDDING_DIMENSIONS} dimensions"),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "model.request_timeout_secs",
                "must be positive",
            ));
        }
        Ok(())
    }
}
