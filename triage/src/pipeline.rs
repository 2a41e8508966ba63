//! Pipeline: composes the classifiers into one pure assessment
//!
//! Order is fixed: guardrail first (may short-circuit), then role filter,
//! conflict resolution and truncation of the retrieved chunks, then issue
//! type, tier, severity and escalation.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::escalation::EscalationInput;
use crate::guardrail;
use crate::issue::{detect_issue_type, detect_multiple_users_affected};
use crate::kb::{
    filter_by_role, resolve_conflicts_with_report, ConflictResolution, KbChunk,
};
use crate::patterns::PATTERN_TABLE_VERSION;
use crate::severity::{classify_severity, has_data_loss_risk, is_security_sensitive};
use crate::signals::{estimate_users_affected, is_blocking, is_critical_issue, requests_no_escalation};
use crate::tier::classify_tier;
use crate::types::{EscalationDecision, GuardrailVerdict, IssueType, Role, Severity, Tier};

/// Pipeline settings, built once and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of chunks kept after filtering and conflict resolution.
    pub top_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// One request as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct TriageRequest<'a> {
    pub message: &'a str,
    pub role: Role,
    /// Prior "that didn't work" messages in this conversation.
    pub resolution_attempts: u32,
    /// Retrieved candidates, best first.
    pub candidates: Vec<KbChunk>,
}

/// Everything the pipeline decided, ready for an audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub verdict: GuardrailVerdict,
    pub issue_type: Option<IssueType>,
    pub multiple_users_affected: bool,
    pub tier: Tier,
    pub severity: Severity,
    pub escalation: EscalationDecision,
    pub justification: Option<String>,
    /// Exact inputs the escalation engine saw; replaying them through
    /// [`EscalationInput::decide`] reproduces `escalation`.
    pub escalation_input: EscalationInput,
    pub chunks: Vec<KbChunk>,
    /// Conflict groups settled before truncation to `top_k`.
    pub conflicts: Vec<ConflictResolution>,
    /// Coverage as given to the escalation engine. Blocked requests are
    /// never retrieved for, so no coverage gap is asserted for them.
    pub kb_coverage: bool,
    /// Audit only; never influences `escalation`.
    pub no_escalation_requested: bool,
    pub pattern_table_version: String,
}

impl Assessment {
    pub fn is_blocked(&self) -> bool {
        self.verdict.blocked
    }
}

/// Guardrail stage alone. Returns the final assessment when the request is
/// blocked so callers can skip retrieval entirely.
pub fn screen(message: &str, role: Role, resolution_attempts: u32) -> Option<Assessment> {
    let verdict = guardrail::check(message, role);
    let severity = verdict.severity?;
    let no_escalation_requested = requests_no_escalation(message);

    // Nothing was retrieved, so no coverage gap is asserted.
    let escalation = EscalationInput {
        tier: Tier::Tier1,
        severity,
        resolution_attempts,
        guardrail_blocked: true,
        issue_type: None,
        kb_coverage: true,
        user_requested_no_escalation: no_escalation_requested,
    };

    Some(Assessment {
        issue_type: None,
        multiple_users_affected: false,
        tier: Tier::Tier1,
        severity,
        escalation: escalation.decide(),
        justification: escalation.justification(),
        escalation_input: escalation,
        chunks: Vec::new(),
        conflicts: Vec::new(),
        kb_coverage: escalation.kb_coverage,
        no_escalation_requested,
        pattern_table_version: PATTERN_TABLE_VERSION.to_string(),
        verdict,
    })
}

/// Run the full pipeline.
pub fn assess(request: TriageRequest<'_>, config: &PipelineConfig) -> Assessment {
    let TriageRequest {
        message,
        role,
        resolution_attempts,
        candidates,
    } = request;

    if let Some(blocked) = screen(message, role, resolution_attempts) {
        return blocked;
    }

    let retrieved = candidates.len();
    let visible = filter_by_role(candidates, role);
    let filtered = visible.len();
    let (mut chunks, conflicts) = resolve_conflicts_with_report(visible);
    let resolved = chunks.len();
    chunks.truncate(config.top_k);
    let kb_coverage = !chunks.is_empty();
    info!(retrieved, filtered, resolved, kept = chunks.len(), "kb chunks prepared");

    let issue_type = Some(detect_issue_type(message, &chunks));
    let multiple_users_affected = detect_multiple_users_affected(message);
    let security_sensitive = is_security_sensitive(message);
    let data_loss_risk = has_data_loss_risk(issue_type, message);

    let tier = classify_tier(
        issue_type,
        resolution_attempts,
        kb_coverage,
        multiple_users_affected,
        is_critical_issue(issue_type),
    );
    let severity = classify_severity(
        issue_type,
        estimate_users_affected(multiple_users_affected),
        is_blocking(message),
        security_sensitive,
        data_loss_risk,
        None,
    );

    let no_escalation_requested = requests_no_escalation(message);
    let escalation = EscalationInput {
        tier,
        severity,
        resolution_attempts,
        guardrail_blocked: false,
        issue_type,
        kb_coverage,
        user_requested_no_escalation: no_escalation_requested,
    };
    let decision = escalation.decide();
    debug!(
        issue = ?issue_type,
        tier = %tier,
        severity = %severity,
        escalate = decision.escalate(),
        "request assessed"
    );

    Assessment {
        verdict: GuardrailVerdict::allowed(),
        issue_type,
        multiple_users_affected,
        tier,
        severity,
        escalation: decision,
        justification: escalation.justification(),
        escalation_input: escalation,
        chunks,
        conflicts,
        kb_coverage,
        no_escalation_requested,
        pattern_table_version: PATTERN_TABLE_VERSION.to_string(),
    }
}
