//! Escalation Engine: deterministic escalate / don't-escalate decision
//!
//! One ordered rule list drives both the boolean decision and the
//! human-readable justification, so the two can never disagree. A caller's
//! "please don't escalate" is recorded for audit and otherwise ignored.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{EscalationDecision, EscalationReason, IssueType, Severity, Tier};

/// Resolution attempts at which an issue is considered stuck.
pub const REPEATED_FAILURE_THRESHOLD: u32 = 2;

/// Everything the engine looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationInput {
    pub tier: Tier,
    pub severity: Severity,
    pub resolution_attempts: u32,
    pub guardrail_blocked: bool,
    pub issue_type: Option<IssueType>,
    pub kb_coverage: bool,
    /// Audit only. Never read by the rule chain.
    pub user_requested_no_escalation: bool,
}

impl EscalationInput {
    /// The first satisfied rule, in priority order, or `None`.
    pub fn first_satisfied_rule(&self) -> Option<EscalationReason> {
        use IssueType::*;

        if self.severity == Severity::Critical {
            Some(EscalationReason::CriticalSeverity)
        } else if self.resolution_attempts >= REPEATED_FAILURE_THRESHOLD {
            Some(EscalationReason::RepeatedFailures)
        } else if self.guardrail_blocked && self.severity >= Severity::High {
            Some(EscalationReason::GuardrailBlocked)
        } else if !self.kb_coverage {
            Some(EscalationReason::NoKbCoverage)
        } else if matches!(
            self.issue_type,
            Some(KernelPanic | SystemicOutage | InfrastructureFailure | ImageBug)
        ) {
            Some(EscalationReason::CriticalIssueType)
        } else if self.issue_type == Some(ContainerInitFailure)
            && self.severity >= Severity::Medium
        {
            Some(EscalationReason::ContainerInitFailure)
        } else if self.tier.requires_human() {
            Some(EscalationReason::HighTier)
        } else if self.severity == Severity::High {
            Some(EscalationReason::HighSeverity)
        } else {
            None
        }
    }

    pub fn decide(&self) -> EscalationDecision {
        let decision = EscalationDecision::from_reason(self.first_satisfied_rule());
        if self.user_requested_no_escalation {
            warn!(
                escalate = decision.escalate(),
                reason = ?decision.reason(),
                "requester asked not to escalate; request ignored"
            );
        }
        debug!(escalate = decision.escalate(), reason = ?decision.reason(), "escalation decided");
        decision
    }

    /// Justification text for the rule that fired, if any.
    pub fn justification(&self) -> Option<String> {
        self.first_satisfied_rule()
            .map(|reason| justification_text(reason, self.tier, self.resolution_attempts))
    }
}

/// Fixed explanation for each rule.
pub fn justification_text(reason: EscalationReason, tier: Tier, resolution_attempts: u32) -> String {
    match reason {
        EscalationReason::CriticalSeverity => {
            "Critical severity issue requires immediate attention from support team.".to_string()
        }
        EscalationReason::RepeatedFailures => format!(
            "Issue persists after {} resolution attempts. Escalating to support engineer.",
            resolution_attempts
        ),
        EscalationReason::GuardrailBlocked => {
            "Security-sensitive request blocked. Support team has been notified.".to_string()
        }
        EscalationReason::NoKbCoverage => {
            "This issue is not covered in the knowledge base. A support engineer will assist you."
                .to_string()
        }
        EscalationReason::CriticalIssueType => {
            "Platform-level issue detected. Escalating to platform engineering team.".to_string()
        }
        EscalationReason::ContainerInitFailure => {
            "Container initialization failure requires support engineer investigation.".to_string()
        }
        EscalationReason::HighTier => {
            format!("This issue requires {} support. A ticket has been created.", tier)
        }
        EscalationReason::HighSeverity => {
            "High severity issue requires support engineer attention.".to_string()
        }
    }
}

/// Decide whether to escalate. `user_requested_no_escalation` is logged and
/// has no effect on the result.
pub fn should_escalate(
    tier: Tier,
    severity: Severity,
    resolution_attempts: u32,
    guardrail_blocked: bool,
    issue_type: Option<IssueType>,
    kb_coverage: bool,
    user_requested_no_escalation: bool,
) -> EscalationDecision {
    EscalationInput {
        tier,
        severity,
        resolution_attempts,
        guardrail_blocked,
        issue_type,
        kb_coverage,
        user_requested_no_escalation,
    }
    .decide()
}

/// Justification for the same inputs as [`should_escalate`]; `None` exactly
/// when it would not escalate.
pub fn get_escalation_reason(
    tier: Tier,
    severity: Severity,
    resolution_attempts: u32,
    guardrail_blocked: bool,
    issue_type: Option<IssueType>,
    kb_coverage: bool,
) -> Option<String> {
    EscalationInput {
        tier,
        severity,
        resolution_attempts,
        guardrail_blocked,
        issue_type,
        kb_coverage,
        user_requested_no_escalation: false,
    }
    .justification()
}
