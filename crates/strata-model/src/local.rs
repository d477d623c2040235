//! In-process embeddings via fastembed (ONNX runtime).
//!
//! Uses [`BGEBaseENV15`](fastembed::EmbeddingModel::BGEBaseENV15), which
//! produces 768-dimensional vectors, the same length as the hosted
//! embedding model, so both backends can share one table. Model files are
//! downloaded on first use and cached at `~/.strata/cache/fastembed/`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};

use crate::{Embedder, ModelError, ensure_dimensions};

/// Output length of `BGEBaseENV15`.
pub const LOCAL_DIMENSIONS: usize = 768;

/// fastembed model behind a mutex.
///
/// [`TextEmbedding::embed`] requires `&mut self` and is synchronous, so each
/// call takes the lock inside [`tokio::task::spawn_blocking`].
pub struct LocalEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl LocalEmbedder {
    /// Load the model, downloading it on first run.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InitFailed`] if download or ONNX initialization fails.
    pub fn new() -> Result<Self, ModelError> {
        let cache_dir = dirs::home_dir().map_or_else(
            || std::path::PathBuf::from(".fastembed_cache"),
            |h| h.join(".strata").join("cache").join("fastembed"),
        );

        let model = TextEmbedding::try_new(
            TextInitOptions::new(EmbeddingModel::BGEBaseENV15)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(true),
        )
        .map_err(|e| ModelError::InitFailed(e.to_string()))?;

        tracing::debug!(dimensions = LOCAL_DIMENSIONS, "local embedding model loaded");
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }

    fn embed_blocking(model: &Mutex<TextEmbedding>, text: String) -> Result<Vec<f32>, ModelError> {
        let mut guard = model
            .lock()
            .map_err(|_| ModelError::EmbedFailed("embedding model lock poisoned".into()))?;
        let mut results = guard
            .embed(vec![text], None)
            .map_err(|e| ModelError::EmbedFailed(e.to_string()))?;
        results
            .pop()
            .ok_or_else(|| ModelError::EmbedFailed("model returned no embeddings".into()))
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();
        let vector = tokio::task::spawn_blocking(move || Self::embed_blocking(&model, text))
            .await
            .map_err(|e| ModelError::EmbedFailed(e.to_string()))??;
        ensure_dimensions(&vector, LOCAL_DIMENSIONS)?;
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        LOCAL_DIMENSIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These download ~400MB of model files on first run.

    #[tokio::test]
    #[ignore = "downloads the BGE model"]
    async fn embeds_768_dims() {
        let embedder = LocalEmbedder::new().expect("engine should init");
        let vector = embedder
            .embed("Rust is a systems programming language")
            .await
            .expect("embed should succeed");
        assert_eq!(vector.len(), 768);
        assert!(vector.iter().all(|v| v.is_finite()));
    }

    #[tokio::test]
    #[ignore = "downloads the BGE model"]
    async fn same_text_same_vector() {
        let embedder = LocalEmbedder::new().expect("engine should init");
        let a = embedder.embed("hello world").await.unwrap();
        let b = embedder.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }
}
