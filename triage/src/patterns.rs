//! Pattern Tables: static, versioned keyword and regex data
//!
//! Pure data owned by the classifiers. Order inside every table is
//! significant: each consumer walks its table front to back and stops at
//! the first hit. Bump [`PATTERN_TABLE_VERSION`] whenever any entry changes
//! so recorded assessments can be traced back to the rules that produced
//! them.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::types::{GuardrailCategory, IssueType, Role, Severity, Tier};

/// Revision of every table in this module.
pub const PATTERN_TABLE_VERSION: &str = "2024.1";

// ── Guardrails ──────────────────────────────────────────────────────────────

/// One forbidden-content category, in source form.
#[derive(Debug)]
pub struct ForbiddenCategory {
    pub category: GuardrailCategory,
    pub severity: Severity,
    /// Must not contain any sensitive term matched by `patterns`.
    pub deflection: &'static str,
    pub patterns: &'static [&'static str],
}

/// Checked in this order; first match wins.
pub const FORBIDDEN_CATEGORIES: &[ForbiddenCategory] = &[
    ForbiddenCategory {
        category: GuardrailCategory::HostAccess,
        severity: Severity::High,
        deflection: "That request is not permitted. It has been logged for review by the support team.",
        patterns: &[
            r"access.*host.*machine",
            r"hypervisor.*access",
            r"ssh.*(?:to|into).*host",
            r"connect.*host.*system",
            r"host.*level.*access",
            r"escape.*(?:vm|container)",
        ],
    },
    ForbiddenCategory {
        category: GuardrailCategory::DisableLogging,
        severity: Severity::High,
        deflection: "That request is not permitted. Platform safety controls are mandatory and cannot be changed.",
        patterns: &[
            r"disable.*log(?:ging)?",
            r"turn\s+off.*(?:log|monitor)",
            r"bypass.*log(?:ging)?",
            r"stop.*log(?:ging)?",
            r"hide.*activity",
            r"run.*quietly.*without.*log",
            r"suppress.*log",
        ],
    },
    ForbiddenCategory {
        category: GuardrailCategory::KernelDebug,
        severity: Severity::High,
        deflection: "That request is not permitted for your role. Please contact support if you need further help.",
        patterns: &[
            r"kernel.*debug",
            r"driver.*modification",
            r"kernel.*module",
            r"modify.*kernel",
            r"kgdb",
            r"kernel.*panic.*debug",
        ],
    },
    ForbiddenCategory {
        category: GuardrailCategory::EtcHosts,
        severity: Severity::Medium,
        deflection: "Requests to alter system configuration are not permitted. Please contact support for name resolution issues.",
        patterns: &[
            r"edit.*/etc/hosts",
            r"modify.*hosts.*file",
            r"change.*/etc/hosts",
            r"add.*(?:to|in).*/etc/hosts",
            r"update.*/etc/hosts",
        ],
    },
    ForbiddenCategory {
        category: GuardrailCategory::Destructive,
        severity: Severity::Critical,
        deflection: "Bulk operations on shared resources are not permitted. Please contact your administrator.",
        patterns: &[
            r"reset.*all.*environment",
            r"delete.*all.*(?:lab|vm|environment)",
            r"destroy.*all",
            r"wipe.*all",
            r"remove.*all.*(?:user|lab)",
        ],
    },
];

/// Whole-word tokens a restricted role may not ask about.
pub fn role_restricted_terms(role: Role) -> &'static [&'static str] {
    match role {
        Role::Trainee => &[
            "sudo",
            "root",
            "admin",
            "systemctl",
            "service",
            "iptables",
            "firewall",
            "selinux",
            "chmod 777",
        ],
        Role::Instructor => &["sudo", "root", "systemctl", "iptables", "firewall"],
        Role::Operator | Role::SupportEngineer | Role::Admin => &[],
    }
}

pub fn role_restriction_deflection(role: Role) -> &'static str {
    match role {
        Role::Trainee => "That command is not available for your role. Please contact your instructor.",
        _ => "That command is not available for your role. Please contact support.",
    }
}

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

/// A forbidden category with its patterns compiled.
pub struct CompiledCategory {
    pub source: &'static ForbiddenCategory,
    pub regexes: Vec<Regex>,
}

pub static COMPILED_CATEGORIES: LazyLock<Vec<CompiledCategory>> = LazyLock::new(|| {
    FORBIDDEN_CATEGORIES
        .iter()
        .map(|source| CompiledCategory {
            source,
            regexes: source.patterns.iter().map(|p| case_insensitive(p)).collect(),
        })
        .collect()
});

/// Word-bounded role restriction regexes, keyed by role in declaration order.
pub static COMPILED_ROLE_TERMS: LazyLock<Vec<(Role, Vec<(&'static str, Regex)>)>> =
    LazyLock::new(|| {
        Role::all()
            .iter()
            .copied()
            .map(|role| {
                let terms = role_restricted_terms(role)
                    .iter()
                    .map(|term| {
                        let pattern = format!(r"\b{}\b", regex::escape(term));
                        (*term, case_insensitive(&pattern))
                    })
                    .collect();
                (role, terms)
            })
            .collect()
    });

// ── Issue detection ─────────────────────────────────────────────────────────

/// Keyword cascade for issue detection: critical first, then technical,
/// then basic. Matched as substrings of the lowercased message.
pub const ISSUE_KEYWORDS: &[(IssueType, &[&str])] = &[
    (IssueType::KernelPanic, &["kernel panic", "kernel crash"]),
    (
        IssueType::SystemicOutage,
        &["systemic", "all users", "entire platform"],
    ),
    (
        IssueType::LabCrash,
        &["lab crash", "vm crash", "lab froze", "vm froze"],
    ),
    (
        IssueType::ContainerInitFailure,
        &["container", "init failed", "startup.sh"],
    ),
    (IssueType::DnsFailure, &["dns", "resolve", "domain"]),
    (
        IssueType::AuthenticationLoop,
        &["redirected", "login loop", "keep logging in"],
    ),
    (
        IssueType::EnvironmentMapping,
        &["wrong environment", "wrong lab", "incorrect environment"],
    ),
    (IssueType::TimeDrift, &["time drift", "clock", "time sync"]),
    (
        IssueType::NetworkConnectivity,
        &["network", "connectivity", "can't connect"],
    ),
    (
        IssueType::PasswordReset,
        &["password", "reset password", "forgot password"],
    ),
    (
        IssueType::MfaReset,
        &["mfa", "multi-factor", "authenticator"],
    ),
    (IssueType::AccountLocked, &["locked out", "account locked"]),
    (
        IssueType::BasicAccess,
        &["access", "can't access", "unable to access"],
    ),
];

pub const MULTI_USER_PHRASES: &[&str] = &[
    "everyone",
    "all users",
    "multiple users",
    "other users",
    "my team",
    "our team",
    "we all",
    "nobody can",
    "no one can",
];

// ── Tier / severity ─────────────────────────────────────────────────────────

pub const ISSUE_TIER_TABLE: &[(IssueType, Tier)] = &[
    (IssueType::GeneralQuestion, Tier::Tier0),
    (IssueType::DocumentationRequest, Tier::Tier0),
    (IssueType::HowTo, Tier::Tier0),
    (IssueType::PasswordReset, Tier::Tier1),
    (IssueType::BasicAccess, Tier::Tier1),
    (IssueType::AccountLocked, Tier::Tier1),
    (IssueType::MfaReset, Tier::Tier1),
    (IssueType::LabCrash, Tier::Tier2),
    (IssueType::VmUnresponsive, Tier::Tier2),
    (IssueType::DnsFailure, Tier::Tier2),
    (IssueType::ContainerInitFailure, Tier::Tier2),
    (IssueType::NetworkConnectivity, Tier::Tier2),
    (IssueType::EnvironmentMapping, Tier::Tier2),
    (IssueType::AuthenticationLoop, Tier::Tier2),
    (IssueType::TimeDrift, Tier::Tier2),
    (IssueType::KernelPanic, Tier::Tier3),
    (IssueType::ImageBug, Tier::Tier3),
    (IssueType::SystemicOutage, Tier::Tier3),
    (IssueType::InfrastructureFailure, Tier::Tier3),
];

pub const SECURITY_KEYWORDS: &[&str] = &[
    "disable logging",
    "bypass",
    "host access",
    "hypervisor",
    "privilege escalation",
    "root access",
    "unauthorized",
];

pub const DATA_LOSS_KEYWORDS: &[&str] = &[
    "lost work",
    "lost progress",
    "lost data",
    "data loss",
    "deleted",
    "corrupted",
    "can't recover",
];

/// Issue types where a mention of work/progress/save implies data at risk.
pub const CRASH_ISSUE_TYPES: &[IssueType] = &[
    IssueType::LabCrash,
    IssueType::VmUnresponsive,
    IssueType::KernelPanic,
];

pub const CRASH_WORK_TERMS: &[&str] = &["work", "progress", "save"];

// ── Request signals ─────────────────────────────────────────────────────────

pub const UNRESOLVED_PHRASES: &[&str] =
    &["didn't work", "not working", "still doesn't", "not resolved"];

pub const BLOCKING_PHRASES: &[&str] = &["can't", "cannot", "unable"];

pub const NO_ESCALATION_PHRASES: &[&str] = &[
    "don't escalate",
    "do not escalate",
    "no need to escalate",
    "no ticket",
    "don't open a ticket",
    "don't create a ticket",
];

// ── KB role filter ──────────────────────────────────────────────────────────

/// Elevated-privilege content hidden from restricted roles. `/etc/` paths are
/// handled by [`RESTRICTED_PATH`] so that `/etc/hosts` stays visible.
pub static PRIVILEGED_CONTENT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"sudo\s+", r"systemctl\s+", r"chmod\s+\d+", r"chown\s+"]
        .iter()
        .map(|p| case_insensitive(p))
        .collect()
});

/// Any `/etc/` path; group 1 is the rest of the path.
pub static RESTRICTED_PATH: LazyLock<Regex> = LazyLock::new(|| case_insensitive(r"/etc/(\S*)"));

/// Path under `/etc/` that stays visible, compared case-insensitively.
pub const ALLOWED_RESTRICTED_PATH: &str = "hosts";

// ── KB conflict resolution ──────────────────────────────────────────────────

/// Document ids sharing this marker belong to the same policy family.
pub static POLICY_FAMILY_ID: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r"auth(?:entication)?-policy"));

/// Title normalization passes, applied in order.
pub static TITLE_STRIP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bversion\s+v?\d+(?:\.\d+)*\b",
        r"\bv?\d+(?:\.\d+)+\b",
        r"\bv\d+\b",
        r"\b(?:19|20)\d{2}\b",
        r"\([^)]*\)",
        r"\b(?:deprecated|current|old|new)\b",
    ]
    .iter()
    .map(|p| case_insensitive(p))
    .collect()
});

pub static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(COMPILED_CATEGORIES.len(), FORBIDDEN_CATEGORIES.len());
        for compiled in COMPILED_CATEGORIES.iter() {
            assert_eq!(compiled.regexes.len(), compiled.source.patterns.len());
        }
        assert_eq!(PRIVILEGED_CONTENT.len(), 4);
        assert_eq!(TITLE_STRIP_PATTERNS.len(), 6);
        assert!(POLICY_FAMILY_ID.is_match("02-authentication-policy"));
        assert!(POLICY_FAMILY_ID.is_match("auth-policy-v2"));
        assert!(!POLICY_FAMILY_ID.is_match("01-auth"));
    }

    #[test]
    fn test_issue_tier_table_covers_every_issue_type() {
        for issue in IssueType::all() {
            assert!(
                ISSUE_TIER_TABLE.iter().any(|(i, _)| i == issue),
                "{} missing from tier table",
                issue
            );
        }
    }

    #[test]
    fn test_only_restricted_roles_have_terms() {
        for role in Role::all() {
            assert_eq!(
                role.is_restricted(),
                !role_restricted_terms(*role).is_empty(),
                "{}",
                role
            );
        }
    }

    #[test]
    fn test_keyword_tables_are_lowercase() {
        let all = ISSUE_KEYWORDS
            .iter()
            .flat_map(|(_, kws)| kws.iter())
            .chain(MULTI_USER_PHRASES)
            .chain(SECURITY_KEYWORDS)
            .chain(DATA_LOSS_KEYWORDS)
            .chain(UNRESOLVED_PHRASES)
            .chain(BLOCKING_PHRASES)
            .chain(NO_ESCALATION_PHRASES);
        for kw in all {
            assert_eq!(*kw, kw.to_lowercase());
        }
    }
}
