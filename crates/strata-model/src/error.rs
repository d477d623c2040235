//! Model service error types.

use strata_core::errors::ErrorKind;

/// Errors from embedding or generation calls.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Required settings (API key, endpoint) are missing.
    #[error("Model service not configured: {0}")]
    NotConfigured(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service returned 429 Too Many Requests.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The call did not finish within its deadline.
    #[error("model call timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Local model initialization failed (download, ONNX runtime, cache issues).
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    /// Local embedding inference failed.
    #[error("Embedding generation failed: {0}")]
    EmbedFailed(String),

    /// Vector length differs from the configured dimension.
    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl ModelError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured(_) => ErrorKind::Validation,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            Self::InitFailed(_) => ErrorKind::Internal,
            Self::Http(_)
            | Self::Api { .. }
            | Self::RateLimited { .. }
            | Self::MalformedResponse(_)
            | Self::EmbedFailed(_)
            | Self::DimensionMismatch { .. } => ErrorKind::ExternalService,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            ModelError::Timeout { timeout_ms: 1 }.kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            ModelError::MalformedResponse("x".into()).kind(),
            ErrorKind::ExternalService
        );
        assert_eq!(
            ModelError::NotConfigured("model.api_key".into()).kind(),
            ErrorKind::Validation
        );
    }
}
