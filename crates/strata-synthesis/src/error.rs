//! Synthesis pipeline error types.

use strata_core::errors::ErrorKind;
use strata_db::error::DatabaseError;
use strata_model::ModelError;

/// Errors from embedding backfill, discovery, development and run orchestration.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Rejected run options, checked before any work.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Input present but unusable, e.g. an item without content.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A model call exceeded its deadline.
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// The model answered, but not with the JSON shape requested.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

impl SynthesisError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Database(e) => e.kind(),
            Self::Model(e) => e.kind(),
            Self::Validation(_) => ErrorKind::Validation,
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::MalformedResponse(_) => ErrorKind::ExternalService,
        }
    }

    pub(crate) fn timeout(operation: &'static str, timeout: std::time::Duration) -> Self {
        Self::Timeout {
            operation,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
