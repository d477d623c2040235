//! Database error types for strata-db.

use strata_core::errors::ErrorKind;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or a column could not be decoded.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A lookup by ID found nothing.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: &'static str, id: String },

    /// Rejected input, checked before any statement runs.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A conditional multi-row transition matched fewer rows than requested.
    /// The transaction was rolled back; nothing changed.
    #[error(
        "State conflict: {affected} of {requested} {entity_type} rows were '{expected}' \
         (offending: {})",
        .offending.join(", ")
    )]
    StateConflict {
        entity_type: &'static str,
        expected: String,
        requested: usize,
        affected: u64,
        offending: Vec<String>,
    },

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoResult | Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::StateConflict { .. } => ErrorKind::StateConflict,
            Self::Query(_)
            | Self::Migration(_)
            | Self::InvalidState(_)
            | Self::LibSql(_)
            | Self::Other(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_lists_offenders() {
        let err = DatabaseError::StateConflict {
            entity_type: "queue_item",
            expected: "pending".into(),
            requested: 2,
            affected: 1,
            offending: vec!["que-1 (used)".into()],
        };
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert!(err.kind().is_no_op());
        assert!(err.to_string().contains("que-1 (used)"));
    }

    #[test]
    fn storage_errors_are_internal() {
        assert_eq!(DatabaseError::Query("x".into()).kind(), ErrorKind::Internal);
        assert_eq!(DatabaseError::NoResult.kind(), ErrorKind::NotFound);
    }
}
