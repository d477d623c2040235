//! Cross-cutting error types for Strata.
//!
//! Domain-specific errors (`DatabaseError`, `ModelError`, `SynthesisError`)
//! live in their own crates. They all map onto [`ErrorKind`], the shared
//! taxonomy callers use to tell "nothing happened" apart from "partially
//! happened".

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy shared by every Strata crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed parameter, rejected before any work.
    Validation,
    /// Digest, candidate or item absent.
    NotFound,
    /// Embedding or text-model call failed.
    ExternalService,
    /// A model call exceeded its deadline.
    Timeout,
    /// Queue item not in the state the transition requires.
    StateConflict,
    /// Input present but unusable (e.g. candidate without content).
    Precondition,
    /// Storage or other unexpected failure.
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::ExternalService => "external_service",
            Self::Timeout => "timeout",
            Self::StateConflict => "state_conflict",
            Self::Precondition => "precondition",
            Self::Internal => "internal",
        }
    }

    /// Whether an error of this kind guarantees no state was mutated.
    #[must_use]
    pub const fn is_no_op(self) -> bool {
        matches!(
            self,
            Self::Validation | Self::NotFound | Self::StateConflict | Self::Precondition
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can be raised by any Strata crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (format, range, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::StateConflict,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Other(_) => ErrorKind::Internal,
        }
    }
}
