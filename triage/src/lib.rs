//! Support Triage Library
//!
//! Deterministic decision pipeline for end-user support messages:
//! - Guardrails that block forbidden requests before anything is answered
//! - Issue-type detection from fixed keyword cascades
//! - Tier and severity classification as ordered rule chains
//! - An escalation engine that ignores "don't escalate" requests
//! - KB conflict resolution and role filtering over retrieved chunks
//!
//! Every classifier is a pure function over its arguments and the static
//! tables in [`patterns`]. Nothing here performs I/O or keeps state between
//! calls, so all of it is safe to call from any number of threads.
//!
//! # Usage
//!
//! ```rust,ignore
//! use triage::{assess, PipelineConfig, Role, TriageRequest};
//!
//! let config = PipelineConfig::default();
//! let assessment = assess(
//!     TriageRequest {
//!         message: "My VM has a kernel panic",
//!         role: Role::Trainee,
//!         resolution_attempts: 0,
//!         candidates: retrieved_chunks,
//!     },
//!     &config,
//! );
//! if assessment.escalation.escalate() {
//!     open_ticket(assessment.justification);
//! }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod escalation;
pub mod guardrail;
pub mod issue;
pub mod kb;
pub mod patterns;
pub mod pipeline;
pub mod severity;
pub mod signals;
pub mod tier;
pub mod types;

pub use error::TriageError;
pub use escalation::{get_escalation_reason, should_escalate, EscalationInput};
pub use guardrail::guardrail_check;
pub use issue::{detect_issue_type, detect_multiple_users_affected};
pub use kb::{
    filter_by_role, normalize_title, resolve_conflicts, resolve_conflicts_with_report,
    ConflictResolution, DocVersion, DocumentRevision, KbChunk, KbDocument, RevisionKey, WinReason,
};
pub use patterns::PATTERN_TABLE_VERSION;
pub use pipeline::{assess, screen, Assessment, PipelineConfig, TriageRequest};
pub use severity::{classify_severity, has_data_loss_risk, is_security_sensitive};
pub use tier::classify_tier;
pub use types::{
    EscalationDecision, EscalationReason, GuardrailCategory, GuardrailVerdict, IssueType, Role,
    Severity, Tier,
};
