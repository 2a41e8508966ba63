//! Severity Classifier and the keyword predicates that feed it.

use tracing::debug;

use crate::patterns::{CRASH_ISSUE_TYPES, CRASH_WORK_TERMS, DATA_LOSS_KEYWORDS, SECURITY_KEYWORDS};
use crate::types::{IssueType, Severity};

/// Users-affected count above which an issue is at least HIGH.
pub const WIDE_IMPACT_THRESHOLD: u32 = 5;

pub fn is_security_sensitive(message: &str) -> bool {
    let lowered = message.to_lowercase();
    SECURITY_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// Explicit loss keywords, or a crash-type issue where the user mentions
/// their work, progress or a save.
pub fn has_data_loss_risk(issue_type: Option<IssueType>, message: &str) -> bool {
    let lowered = message.to_lowercase();
    if DATA_LOSS_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return true;
    }
    match issue_type {
        Some(issue) if CRASH_ISSUE_TYPES.contains(&issue) => {
            CRASH_WORK_TERMS.iter().any(|t| lowered.contains(t))
        }
        _ => false,
    }
}

/// Ordered rule chain, first true rule wins. Data loss and security always
/// produce CRITICAL.
pub fn classify_severity(
    issue_type: Option<IssueType>,
    users_affected: u32,
    blocking: bool,
    security_sensitive: bool,
    data_loss_risk: bool,
    guardrail_severity: Option<Severity>,
) -> Severity {
    use IssueType::*;

    let (severity, rule) = if data_loss_risk || security_sensitive {
        (Severity::Critical, "data_loss_or_security")
    } else if matches!(issue_type, Some(SystemicOutage | InfrastructureFailure)) {
        (Severity::Critical, "platform_issue")
    } else if let Some(g @ (Severity::Critical | Severity::High)) = guardrail_severity {
        (g, "guardrail")
    } else if users_affected > WIDE_IMPACT_THRESHOLD {
        (Severity::High, "wide_impact")
    } else if matches!(issue_type, Some(KernelPanic | ImageBug | LabCrash)) {
        (Severity::High, "crash_issue")
    } else if blocking {
        (Severity::Medium, "blocking")
    } else if matches!(
        issue_type,
        Some(ContainerInitFailure | AuthenticationLoop | EnvironmentMapping | VmUnresponsive)
    ) {
        (Severity::Medium, "degraded_environment")
    } else {
        (Severity::Low, "default")
    };
    debug!(severity = %severity, rule, "severity classified");
    severity
}
