//! Tier Classifier: ordered rule chain from issue signals to support tier.
//!
//! The requester's role is deliberately not an input.

use tracing::debug;

use crate::patterns::ISSUE_TIER_TABLE;
use crate::types::{IssueType, Tier};

/// Static issue → tier mapping.
pub fn tier_for_issue(issue: IssueType) -> Option<Tier> {
    ISSUE_TIER_TABLE
        .iter()
        .find(|(i, _)| *i == issue)
        .map(|(_, t)| *t)
}

/// First true rule wins:
/// 1. critical issue → TIER_3
/// 2. multiple users affected → TIER_2
/// 3. two or more failed resolution attempts → TIER_2
/// 4. no KB coverage → TIER_1
/// 5. issue type in the static table → mapped tier
/// 6. covered and no attempts yet → TIER_0
/// 7. otherwise TIER_1
pub fn classify_tier(
    issue_type: Option<IssueType>,
    resolution_attempts: u32,
    kb_coverage: bool,
    multiple_users_affected: bool,
    is_critical: bool,
) -> Tier {
    let (tier, rule) = if is_critical {
        (Tier::Tier3, "critical")
    } else if multiple_users_affected {
        (Tier::Tier2, "multiple_users")
    } else if resolution_attempts >= 2 {
        (Tier::Tier2, "repeated_attempts")
    } else if !kb_coverage {
        (Tier::Tier1, "no_kb_coverage")
    } else if let Some(mapped) = issue_type.and_then(tier_for_issue) {
        (mapped, "issue_table")
    } else if resolution_attempts == 0 {
        (Tier::Tier0, "self_service")
    } else {
        (Tier::Tier1, "default")
    };
    debug!(tier = %tier, rule, "tier classified");
    tier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_is_tier3() {
        assert_eq!(classify_tier(Some(IssueType::KernelPanic), 0, true, false, true), Tier::Tier3);
        assert_eq!(classify_tier(None, 5, false, true, true), Tier::Tier3);
    }

    #[test]
    fn test_multiple_users_floor() {
        // Table would say TIER_1 for password_reset.
        assert_eq!(classify_tier(Some(IssueType::PasswordReset), 0, true, true, false), Tier::Tier2);
    }

    #[test]
    fn test_repeated_attempts() {
        assert_eq!(classify_tier(Some(IssueType::HowTo), 2, true, false, false), Tier::Tier2);
        assert_eq!(classify_tier(Some(IssueType::HowTo), 1, true, false, false), Tier::Tier0);
    }

    #[test]
    fn test_no_coverage_is_tier1() {
        assert_eq!(classify_tier(None, 0, false, false, false), Tier::Tier1);
        // Beats the table, even for a TIER_3 issue.
        assert_eq!(classify_tier(Some(IssueType::ImageBug), 0, false, false, false), Tier::Tier1);
    }

    #[test]
    fn test_table_lookup() {
        assert_eq!(classify_tier(Some(IssueType::DnsFailure), 0, true, false, false), Tier::Tier2);
        assert_eq!(classify_tier(Some(IssueType::MfaReset), 1, true, false, false), Tier::Tier1);
        assert_eq!(classify_tier(Some(IssueType::GeneralQuestion), 0, true, false, false), Tier::Tier0);
    }

    #[test]
    fn test_absent_issue_type() {
        assert_eq!(classify_tier(None, 0, true, false, false), Tier::Tier0);
        assert_eq!(classify_tier(None, 1, true, false, false), Tier::Tier1);
    }
}
