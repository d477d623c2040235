//! Hosted text model client (Gemini-style REST API).
//!
//! Two endpoints are used:
//!
//! - `POST {base_url}/models/{embedding_model}:embedContent`
//! - `POST {base_url}/models/{generation_model}:generateContent`
//!
//! The API key travels in the `x-goog-api-key` header. Every call goes
//! through [`check_response`] so rate limits and server errors surface as
//! typed [`ModelError`]s.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strata_config::ModelConfig;

use crate::http::check_response;
use crate::{CompletionRequest, Embedder, Generator, ModelError, ensure_dimensions};

const API_KEY_HEADER: &str = "x-goog-api-key";
const GENERATION_TEMPERATURE: f32 = 0.7;

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    generation_model: String,
    dimensions: usize,
}

impl GeminiClient {
    /// Build a client from `[model]` settings.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotConfigured`] when the API key is blank, or
    /// [`ModelError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        if !config.is_configured() {
            return Err(ModelError::NotConfigured(
                "model.api_key is not set (STRATA_MODEL__API_KEY)".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            embedding_model: config.embedding_model.clone(),
            generation_model: config.generation_model.clone(),
            dimensions: config.dimensions,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }
}

// ── Wire types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeneratedCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeneratedCandidate {
    content: Option<GeneratedContent>,
}

#[derive(Debug, Deserialize)]
struct GeneratedContent {
    #[serde(default)]
    parts: Vec<GeneratedPart>,
}

#[derive(Debug, Deserialize)]
struct GeneratedPart {
    #[serde(default)]
    text: String,
}

fn embed_values(response: EmbedResponse) -> Result<Vec<f32>, ModelError> {
    response
        .embedding
        .map(|e| e.values)
        .filter(|values| !values.is_empty())
        .ok_or_else(|| ModelError::MalformedResponse("embedding missing from response".into()))
}

fn generated_text(response: GenerateResponse) -> Result<String, ModelError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ModelError::MalformedResponse(
            "generation returned no text".into(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let body = EmbedRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content {
                role: None,
                parts: vec![Part { text }],
            },
            output_dimensionality: Some(self.dimensions),
        };
        let resp = self
            .http
            .post(self.endpoint(&self.embedding_model, "embedContent"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let parsed: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;
        let vector = embed_values(parsed)?;
        ensure_dimensions(&vector, self.dimensions)?;
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: GENERATION_TEMPERATURE,
            },
        };
        let call = async {
            let resp = self
                .http
                .post(self.endpoint(&self.generation_model, "generateContent"))
                .header(API_KEY_HEADER, &self.api_key)
                .json(&body)
                .send()
                .await?;
            let resp = check_response(resp).await?;
            resp.json::<GenerateResponse>()
                .await
                .map_err(|e| ModelError::MalformedResponse(e.to_string()))
        };
        let parsed = tokio::time::timeout(request.timeout, call)
            .await
            .map_err(|_| ModelError::Timeout {
                timeout_ms: u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;
        generated_text(parsed)
    }
}
