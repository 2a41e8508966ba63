//! Parse errors for the string forms of triage tags.
//!
//! Classifiers are total and never fail; these errors only surface when an
//! external string (request payload, config, CLI flag) is converted into one
//! of the closed tag sets.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriageError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown tier: {0}")]
    UnknownTier(String),

    #[error("unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("unknown issue type: {0}")]
    UnknownIssueType(String),

    #[error("unknown guardrail category: {0}")]
    UnknownCategory(String),
}
