//! Shared value types for the triage pipeline.
//!
//! Every type here is request-scoped: created per invocation, consumed by the
//! caller, never cached. Ordering on [`Tier`] and [`Severity`] is defined by an
//! explicit numeric rank so that reordering variants cannot silently change
//! comparisons such as `severity >= Severity::Medium`.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TriageError;

// ── Tier ────────────────────────────────────────────────────────────────────

/// Support tier, from self-service to platform engineering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Self-service via the knowledge base
    #[serde(rename = "TIER_0")]
    Tier0,
    /// Human generalist
    #[serde(rename = "TIER_1")]
    Tier1,
    /// Support engineer
    #[serde(rename = "TIER_2")]
    Tier2,
    /// Platform engineering
    #[serde(rename = "TIER_3")]
    Tier3,
}

impl Tier {
    pub fn all() -> &'static [Tier] {
        &[Self::Tier0, Self::Tier1, Self::Tier2, Self::Tier3]
    }

    /// Explicit escalation depth. Comparisons go through this, never through
    /// declaration order.
    pub fn rank(self) -> u8 {
        match self {
            Self::Tier0 => 0,
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tier0 => "TIER_0",
            Self::Tier1 => "TIER_1",
            Self::Tier2 => "TIER_2",
            Self::Tier3 => "TIER_3",
        }
    }

    /// Whether a human on the support side has to pick this up.
    pub fn requires_human(self) -> bool {
        self >= Self::Tier2
    }
}

impl PartialOrd for Tier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TriageError::UnknownTier(s.to_string()))
    }
}

// ── Severity ────────────────────────────────────────────────────────────────

/// Impact level of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn all() -> &'static [Severity] {
        &[Self::Low, Self::Medium, Self::High, Self::Critical]
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 10,
            Self::Medium => 20,
            Self::High => 30,
            Self::Critical => 40,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TriageError::UnknownSeverity(s.to_string()))
    }
}

// ── Role ────────────────────────────────────────────────────────────────────

/// Requester role. Only guardrails and KB filtering look at it; tier
/// classification never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Trainee,
    Instructor,
    Operator,
    SupportEngineer,
    Admin,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[
            Self::Trainee,
            Self::Instructor,
            Self::Operator,
            Self::SupportEngineer,
            Self::Admin,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trainee => "trainee",
            Self::Instructor => "instructor",
            Self::Operator => "operator",
            Self::SupportEngineer => "support_engineer",
            Self::Admin => "admin",
        }
    }

    /// Roles that get the role-restriction guardrail and filtered KB content.
    pub fn is_restricted(self) -> bool {
        matches!(self, Self::Trainee | Self::Instructor)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| TriageError::UnknownRole(s.to_string()))
    }
}

// ── IssueType ───────────────────────────────────────────────────────────────

/// Closed set of issue tags. `GeneralQuestion` is the universal fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    GeneralQuestion,
    DocumentationRequest,
    HowTo,
    PasswordReset,
    BasicAccess,
    AccountLocked,
    MfaReset,
    LabCrash,
    VmUnresponsive,
    DnsFailure,
    ContainerInitFailure,
    NetworkConnectivity,
    EnvironmentMapping,
    AuthenticationLoop,
    TimeDrift,
    KernelPanic,
    ImageBug,
    SystemicOutage,
    InfrastructureFailure,
}

impl IssueType {
    pub fn all() -> &'static [IssueType] {
        &[
            Self::GeneralQuestion,
            Self::DocumentationRequest,
            Self::HowTo,
            Self::PasswordReset,
            Self::BasicAccess,
            Self::AccountLocked,
            Self::MfaReset,
            Self::LabCrash,
            Self::VmUnresponsive,
            Self::DnsFailure,
            Self::ContainerInitFailure,
            Self::NetworkConnectivity,
            Self::EnvironmentMapping,
            Self::AuthenticationLoop,
            Self::TimeDrift,
            Self::KernelPanic,
            Self::ImageBug,
            Self::SystemicOutage,
            Self::InfrastructureFailure,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeneralQuestion => "general_question",
            Self::DocumentationRequest => "documentation_request",
            Self::HowTo => "how_to",
            Self::PasswordReset => "password_reset",
            Self::BasicAccess => "basic_access",
            Self::AccountLocked => "account_locked",
            Self::MfaReset => "mfa_reset",
            Self::LabCrash => "lab_crash",
            Self::VmUnresponsive => "vm_unresponsive",
            Self::DnsFailure => "dns_failure",
            Self::ContainerInitFailure => "container_init_failure",
            Self::NetworkConnectivity => "network_connectivity",
            Self::EnvironmentMapping => "environment_mapping",
            Self::AuthenticationLoop => "authentication_loop",
            Self::TimeDrift => "time_drift",
            Self::KernelPanic => "kernel_panic",
            Self::ImageBug => "image_bug",
            Self::SystemicOutage => "systemic_outage",
            Self::InfrastructureFailure => "infrastructure_failure",
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|i| i.as_str() == wanted)
            .ok_or_else(|| TriageError::UnknownIssueType(s.to_string()))
    }
}

// ── Guardrail ───────────────────────────────────────────────────────────────

/// Forbidden-content categories, plus the role-restriction fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailCategory {
    HostAccess,
    DisableLogging,
    KernelDebug,
    EtcHosts,
    Destructive,
    RoleRestriction,
}

impl GuardrailCategory {
    pub fn all() -> &'static [GuardrailCategory] {
        &[
            Self::HostAccess,
            Self::DisableLogging,
            Self::KernelDebug,
            Self::EtcHosts,
            Self::Destructive,
            Self::RoleRestriction,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostAccess => "host_access",
            Self::DisableLogging => "disable_logging",
            Self::KernelDebug => "kernel_debug",
            Self::EtcHosts => "etc_hosts",
            Self::Destructive => "destructive",
            Self::RoleRestriction => "role_restriction",
        }
    }
}

impl std::fmt::Display for GuardrailCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuardrailCategory {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| TriageError::UnknownCategory(s.to_string()))
    }
}

/// Outcome of a guardrail check.
///
/// When `blocked` is true, `category`, `severity` and `deflection_message` are
/// all present; when false, all three are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    pub blocked: bool,
    pub category: Option<GuardrailCategory>,
    pub severity: Option<Severity>,
    pub deflection_message: Option<String>,
}

impl GuardrailVerdict {
    pub fn allowed() -> Self {
        Self {
            blocked: false,
            category: None,
            severity: None,
            deflection_message: None,
        }
    }

    pub fn blocked(category: GuardrailCategory, severity: Severity, message: &str) -> Self {
        Self {
            blocked: true,
            category: Some(category),
            severity: Some(severity),
            deflection_message: Some(message.to_string()),
        }
    }
}

// ── Escalation ──────────────────────────────────────────────────────────────

/// Tag of the escalation rule that fired. Declared in rule priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationReason {
    CriticalSeverity,
    RepeatedFailures,
    GuardrailBlocked,
    NoKbCoverage,
    CriticalIssueType,
    ContainerInitFailure,
    HighTier,
    HighSeverity,
}

impl EscalationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CriticalSeverity => "CRITICAL_SEVERITY",
            Self::RepeatedFailures => "REPEATED_FAILURES",
            Self::GuardrailBlocked => "GUARDRAIL_BLOCKED",
            Self::NoKbCoverage => "NO_KB_COVERAGE",
            Self::CriticalIssueType => "CRITICAL_ISSUE_TYPE",
            Self::ContainerInitFailure => "CONTAINER_INIT_FAILURE",
            Self::HighTier => "HIGH_TIER",
            Self::HighSeverity => "HIGH_SEVERITY",
        }
    }
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escalate / don't escalate, plus the rule that decided it.
///
/// `reason` is `Some` exactly when `escalate` is true. Fields are private;
/// deserialization rejects payloads where the two disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEscalationDecision")]
pub struct EscalationDecision {
    escalate: bool,
    reason: Option<EscalationReason>,
}

#[derive(Deserialize)]
struct RawEscalationDecision {
    escalate: bool,
    reason: Option<EscalationReason>,
}

impl TryFrom<RawEscalationDecision> for EscalationDecision {
    type Error = String;

    fn try_from(raw: RawEscalationDecision) -> Result<Self, Self::Error> {
        if raw.escalate != raw.reason.is_some() {
            return Err(format!(
                "escalate={} is inconsistent with reason={:?}",
                raw.escalate, raw.reason
            ));
        }
        Ok(Self::from_reason(raw.reason))
    }
}

impl EscalationDecision {
    pub fn from_reason(reason: Option<EscalationReason>) -> Self {
        Self {
            escalate: reason.is_some(),
            reason,
        }
    }

    pub fn none() -> Self {
        Self::from_reason(None)
    }

    pub fn escalate(&self) -> bool {
        self.escalate
    }

    pub fn reason(&self) -> Option<EscalationReason> {
        self.reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order_follows_rank() {
        assert!(Tier::Tier0 < Tier::Tier1);
        assert!(Tier::Tier1 < Tier::Tier2);
        assert!(Tier::Tier2 < Tier::Tier3);
        let mut tiers = vec![Tier::Tier3, Tier::Tier0, Tier::Tier2, Tier::Tier1];
        tiers.sort();
        assert_eq!(tiers, Tier::all());
    }

    #[test]
    fn test_severity_ranked_comparisons() {
        assert!(Severity::High >= Severity::Medium);
        assert!(Severity::Critical >= Severity::Medium);
        assert!(Severity::Medium >= Severity::Medium);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::all().windows(2).all(|w| w[0].rank() < w[1].rank()));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Tier::Tier2).unwrap(), "\"TIER_2\"");
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"CRITICAL\""
        );
        assert_eq!(
            serde_json::to_string(&Role::SupportEngineer).unwrap(),
            "\"support_engineer\""
        );
        assert_eq!(
            serde_json::to_string(&EscalationReason::NoKbCoverage).unwrap(),
            "\"NO_KB_COVERAGE\""
        );
        assert_eq!(
            serde_json::to_string(&IssueType::ContainerInitFailure).unwrap(),
            "\"container_init_failure\""
        );
    }

    #[test]
    fn test_display_matches_serde_tag() {
        for issue in IssueType::all() {
            let json = serde_json::to_string(issue).unwrap();
            assert_eq!(json, format!("\"{}\"", issue));
        }
        for category in GuardrailCategory::all() {
            let json = serde_json::to_string(category).unwrap();
            assert_eq!(json, format!("\"{}\"", category));
        }
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!("tier_3".parse::<Tier>().unwrap(), Tier::Tier3);
        assert_eq!("medium".parse::<Severity>().unwrap(), Severity::Medium);
        assert_eq!("support-engineer".parse::<Role>().unwrap(), Role::SupportEngineer);
        assert_eq!(
            "kernel_panic".parse::<IssueType>().unwrap(),
            IssueType::KernelPanic
        );
        assert!(matches!(
            "wizard".parse::<Role>(),
            Err(TriageError::UnknownRole(_))
        ));
        assert!(matches!(
            "TIER_9".parse::<Tier>(),
            Err(TriageError::UnknownTier(_))
        ));
        assert!(matches!(
            "printer_jam".parse::<IssueType>(),
            Err(TriageError::UnknownIssueType(_))
        ));
    }

    #[test]
    fn test_restricted_roles() {
        assert!(Role::Trainee.is_restricted());
        assert!(Role::Instructor.is_restricted());
        assert!(!Role::Operator.is_restricted());
        assert!(!Role::SupportEngineer.is_restricted());
        assert!(!Role::Admin.is_restricted());
    }

    #[test]
    fn test_decision_reason_iff_escalate() {
        let yes = EscalationDecision::from_reason(Some(EscalationReason::HighTier));
        assert!(yes.escalate());
        assert_eq!(yes.reason(), Some(EscalationReason::HighTier));

        let no = EscalationDecision::none();
        assert!(!no.escalate());
        assert!(no.reason().is_none());
    }

    #[test]
    fn test_decision_deserialize_rejects_inconsistent_fields() {
        let yes = EscalationDecision::from_reason(Some(EscalationReason::HighTier));
        let json = serde_json::to_string(&yes).unwrap();
        let back: EscalationDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, yes);

        let none: EscalationDecision =
            serde_json::from_str(r#"{"escalate":false,"reason":null}"#).unwrap();
        assert_eq!(none, EscalationDecision::none());

        assert!(serde_json::from_str::<EscalationDecision>(
            r#"{"escalate":true,"reason":null}"#
        )
        .is_err());
        let reason = serde_json::to_string(&EscalationReason::HighTier).unwrap();
        let mismatched = format!(r#"{{"escalate":false,"reason":{}}}"#, reason);
        assert!(serde_json::from_str::<EscalationDecision>(&mismatched).is_err());
    }

    #[test]
    fn test_tier_requires_human() {
        assert!(!Tier::Tier0.requires_human());
        assert!(!Tier::Tier1.requires_human());
        assert!(Tier::Tier2.requires_human());
        assert!(Tier::Tier3.requires_human());
    }
}
