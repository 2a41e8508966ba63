//! Request signals: small text predicates that turn raw conversation data
//! into classifier inputs.

use crate::patterns::{BLOCKING_PHRASES, NO_ESCALATION_PHRASES, UNRESOLVED_PHRASES};
use crate::types::IssueType;

/// Users assumed affected when a multi-user phrase is present.
pub const MULTI_USER_ESTIMATE: u32 = 10;

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    phrases.iter().any(|p| lowered.contains(p))
}

/// Prior user messages reporting that a suggested fix did not work.
pub fn count_resolution_attempts<S: AsRef<str>>(user_messages: &[S]) -> u32 {
    let hits = user_messages
        .iter()
        .filter(|m| contains_any(m.as_ref(), UNRESOLVED_PHRASES))
        .count();
    u32::try_from(hits).unwrap_or(u32::MAX)
}

pub fn is_blocking(message: &str) -> bool {
    contains_any(message, BLOCKING_PHRASES)
}

pub fn estimate_users_affected(multiple_users_affected: bool) -> u32 {
    if multiple_users_affected {
        MULTI_USER_ESTIMATE
    } else {
        1
    }
}

pub fn is_critical_issue(issue_type: Option<IssueType>) -> bool {
    matches!(
        issue_type,
        Some(IssueType::KernelPanic | IssueType::SystemicOutage)
    )
}

/// "Don't escalate" style requests. Recorded for audit only.
pub fn requests_no_escalation(message: &str) -> bool {
    contains_any(message, NO_ESCALATION_PHRASES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_resolution_attempts() {
        let msgs = [
            "I tried that and it didn't work",
            "thanks",
            "Still NOT WORKING",
            "it's not resolved",
        ];
        assert_eq!(count_resolution_attempts(&msgs), 3);
        assert_eq!(count_resolution_attempts::<&str>(&[]), 0);
    }

    #[test]
    fn test_blocking() {
        assert!(is_blocking("I can't start the lab"));
        assert!(is_blocking("Cannot log in"));
        assert!(is_blocking("unable to reach the portal"));
        assert!(!is_blocking("how does the lab timer work"));
    }

    #[test]
    fn test_users_affected_estimate() {
        assert_eq!(estimate_users_affected(true), 10);
        assert_eq!(estimate_users_affected(false), 1);
    }

    #[test]
    fn test_critical_issue() {
        assert!(is_critical_issue(Some(IssueType::KernelPanic)));
        assert!(is_critical_issue(Some(IssueType::SystemicOutage)));
        assert!(!is_critical_issue(Some(IssueType::InfrastructureFailure)));
        assert!(!is_critical_issue(None));
    }

    #[test]
    fn test_no_escalation_request() {
        assert!(requests_no_escalation("Please DON'T ESCALATE this"));
        assert!(requests_no_escalation("no ticket please"));
        assert!(!requests_no_escalation("please escalate"));
    }
}
