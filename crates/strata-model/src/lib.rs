//! # strata-model
//!
//! Contract and clients for the two text-model operations Strata needs:
//!
//! - **Embedding**: text → fixed-dimension `f32` vector ([`Embedder`]).
//! - **Generation**: prompt → text, bounded by a token budget and a
//!   deadline ([`Generator`]).
//!
//! Two embedding backends are available, selected by
//! [`ModelConfig::embedding_backend`]:
//!
//! - [`GeminiClient`]: hosted `embedContent` / `generateContent` endpoints.
//! - [`LocalEmbedder`]: in-process fastembed (`BGEBaseENV15`, 768 dims).
//!
//! Generation always goes through the hosted client. Pipeline code only
//! sees the traits, so tests substitute deterministic fakes.

pub mod error;
pub mod gemini;
pub mod http;
pub mod local;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use strata_config::{EmbeddingBackend, ModelConfig};

pub use error::ModelError;
pub use gemini::GeminiClient;
pub use local::LocalEmbedder;

/// Turns text into a vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text. The result has exactly [`Self::dimensions`] entries.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;

    /// Vector length this embedder produces.
    fn dimensions(&self) -> usize;
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    /// Hard deadline for the whole call.
    pub timeout: Duration,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            timeout,
        }
    }
}

/// Produces text from a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;
}

/// Embedder and generator pair handed to the synthesis pipeline.
#[derive(Clone)]
pub struct ModelService {
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
}

impl ModelService {
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>) -> Self {
        Self {
            embedder,
            generator,
        }
    }

    /// Build both halves from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotConfigured`] without an API key, or
    /// [`ModelError::InitFailed`] if the local model cannot be loaded.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let client = Arc::new(GeminiClient::from_config(config)?);
        let embedder: Arc<dyn Embedder> = match config.embedding_backend {
            EmbeddingBackend::Api => client.clone(),
            EmbeddingBackend::Local => Arc::new(LocalEmbedder::new()?),
        };
        Ok(Self::new(embedder, client))
    }
}

/// Build only the embedder; the local backend needs no API key.
///
/// # Errors
///
/// Same as [`ModelService::from_config`] for the selected backend.
pub fn embedder_from_config(config: &ModelConfig) -> Result<Arc<dyn Embedder>, ModelError> {
    match config.embedding_backend {
        EmbeddingBackend::Api => Ok(Arc::new(GeminiClient::from_config(config)?)),
        EmbeddingBackend::Local => Ok(Arc::new(LocalEmbedder::new()?)),
    }
}

/// Reject vectors whose length differs from `expected`.
///
/// # Errors
///
/// Returns [`ModelError::DimensionMismatch`].
pub fn ensure_dimensions(vector: &[f32], expected: usize) -> Result<(), ModelError> {
    if vector.len() == expected {
        Ok(())
    } else {
        Err(ModelError::DimensionMismatch {
            expected,
            actual: vector.len(),
        })
    }
}
