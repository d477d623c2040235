//! Status enums and classification types for Strata.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Status enums with state machines provide `allowed_next_states()` to enforce
//! valid transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// QueueStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a queue item.
///
/// ```text
/// pending → selected → used
///         → skipped
///         → expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Selected,
    Used,
    Expired,
    Skipped,
}

impl QueueStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Selected,
        Self::Used,
        Self::Expired,
        Self::Skipped,
    ];

    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Selected, Self::Skipped, Self::Expired],
            Self::Selected => &[Self::Used],
            Self::Used | Self::Expired | Self::Skipped => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.allowed_next_states().is_empty()
    }

    /// Selected or used items count against a source's quota.
    #[must_use]
    pub const fn is_committed(self) -> bool {
        matches!(self, Self::Selected | Self::Used)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Selected => "selected",
            Self::Used => "used",
            Self::Expired => "expired",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SynthesisType
// ---------------------------------------------------------------------------

/// Kind of cross-temporal connection between a source item and a related one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisType {
    /// The same topic has moved on since the older item.
    Evolution,
    /// Today's item confirms what the older item claimed.
    Validation,
    /// The two items take opposing stances.
    Contrast,
    /// A recurring shape across otherwise separate stories.
    Pattern,
    /// Semantically close items from different fields.
    CrossDomain,
}

impl SynthesisType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Evolution => "evolution",
            Self::Validation => "validation",
            Self::Contrast => "contrast",
            Self::Pattern => "pattern",
            Self::CrossDomain => "cross_domain",
        }
    }

    /// One-line description used when prompting the text model.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Evolution => "the topic has evolved since the earlier item",
            Self::Validation => "the new item validates the earlier one",
            Self::Contrast => "the items take contrasting positions",
            Self::Pattern => "the items share a recurring pattern",
            Self::CrossDomain => "the items connect two different domains",
        }
    }
}

impl fmt::Display for SynthesisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PipelinePhase
// ---------------------------------------------------------------------------

/// Phase of a synthesis run.
///
/// ```text
/// discovering → scoring → developing → complete
///                                    → failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Discovering,
    Scoring,
    Developing,
    Complete,
    Failed,
}

impl PipelinePhase {
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Discovering => &[Self::Scoring, Self::Developing, Self::Failed],
            Self::Scoring => &[Self::Discovering, Self::Developing, Self::Failed],
            Self::Developing => &[Self::Complete, Self::Failed],
            Self::Complete | Self::Failed => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovering => "discovering",
            Self::Scoring => "scoring",
            Self::Developing => "developing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RunOutcome / StopReason
// ---------------------------------------------------------------------------

/// How a synthesis run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every planned item was visited.
    Complete,
    /// The run stopped early; committed rows remain.
    Partial,
}

/// Why a run stopped before visiting every planned item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Cancelled,
    DeadlineExceeded,
}

impl StopReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
