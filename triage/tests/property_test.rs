//! Property tests for the triage pipeline.
//!
//! Tests verify:
//! - Every classifier is deterministic across repeated calls
//! - The no-escalation flag never changes a decision
//! - Tier floors for multi-user and critical issues
//! - Data loss and security always produce CRITICAL
//! - Tier does not depend on requester role
//! - Deflection messages never echo blocked vocabulary
//! - Concurrent callers see identical results

use chrono::NaiveDate;
use triage::{
    assess, classify_severity, classify_tier, detect_issue_type, guardrail_check,
    normalize_title, patterns::FORBIDDEN_CATEGORIES, resolve_conflicts, should_escalate,
    GuardrailCategory, IssueType, KbChunk, KbDocument, PipelineConfig, Role, Severity, Tier,
    TriageRequest,
};

const RUNS: usize = 5;

const MESSAGES: &[&str] = &[
    "My VM has a kernel panic",
    "How do I access the host machine?",
    "I forgot my password and can't log in",
    "DNS won't resolve anything, nobody can reach the lab",
    "Please disable logging for my session",
    "how do I run sudo in the lab",
    "container init failed again, didn't work",
    "What are the lab hours?",
    "",
];

fn attempts() -> [u32; 4] {
    [0, 1, 2, 5]
}

fn issue_options() -> Vec<Option<IssueType>> {
    std::iter::once(None)
        .chain(IssueType::all().iter().copied().map(Some))
        .collect()
}

fn doc_chunk(id: &str, title: &str, version: &str, day: u32, text: &str) -> KbChunk {
    KbChunk::new(
        KbDocument {
            id: id.to_string(),
            title: title.to_string(),
            version: version.to_string(),
            last_updated: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            tags: vec![],
        },
        "",
        text,
    )
}

fn sample_chunks() -> Vec<KbChunk> {
    vec![
        doc_chunk("01-auth", "Authentication", "2.0", 1, "reset via portal"),
        doc_chunk("01-auth", "Authentication", "2.1", 15, "reset via new portal"),
        doc_chunk("dns", "DNS Troubleshooting (old)", "1", 3, "flush the resolver cache"),
        doc_chunk("dns-2", "DNS Troubleshooting 2024", "1.1", 4, "check /etc/resolv.conf"),
        doc_chunk("svc", "Services", "3", 5, "sudo systemctl restart lab"),
        doc_chunk("kp", "Kernel Panic Recovery", "1", 6, "kernel panic recovery steps"),
    ]
}

#[test]
fn classifiers_are_deterministic() {
    let chunks = sample_chunks();
    for msg in MESSAGES {
        for role in Role::all() {
            let first = guardrail_check(msg, *role);
            let issue = detect_issue_type(msg, &chunks);
            for _ in 0..RUNS {
                assert_eq!(guardrail_check(msg, *role), first);
                assert_eq!(detect_issue_type(msg, &chunks), issue);
            }
        }
    }

    for issue in issue_options() {
        for n in attempts() {
            for flags in 0..8u8 {
                let (cov, multi, crit) = (flags & 1 != 0, flags & 2 != 0, flags & 4 != 0);
                let tier = classify_tier(issue, n, cov, multi, crit);
                let sev = classify_severity(issue, n * 3, cov, multi, crit, None);
                let dec = should_escalate(tier, sev, n, multi, issue, cov, crit);
                for _ in 0..RUNS {
                    assert_eq!(classify_tier(issue, n, cov, multi, crit), tier);
                    assert_eq!(classify_severity(issue, n * 3, cov, multi, crit, None), sev);
                    assert_eq!(should_escalate(tier, sev, n, multi, issue, cov, crit), dec);
                }
            }
        }
    }

    let resolved = resolve_conflicts(chunks.clone());
    for _ in 0..RUNS {
        assert_eq!(resolve_conflicts(chunks.clone()), resolved);
    }
}

#[test]
fn no_escalation_flag_never_changes_outcome() {
    for tier in Tier::all() {
        for sev in Severity::all() {
            for issue in issue_options() {
                for n in attempts() {
                    for blocked in [false, true] {
                        for cov in [false, true] {
                            let a = should_escalate(*tier, *sev, n, blocked, issue, cov, false);
                            let b = should_escalate(*tier, *sev, n, blocked, issue, cov, true);
                            assert_eq!(a, b);
                            assert_eq!(a.escalate(), a.reason().is_some());
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn tier_floors_hold() {
    for issue in issue_options() {
        for n in attempts() {
            for cov in [false, true] {
                assert!(classify_tier(issue, n, cov, true, false) >= Tier::Tier2);
                assert_eq!(classify_tier(issue, n, cov, true, true), Tier::Tier3);
                assert_eq!(classify_tier(issue, n, cov, false, true), Tier::Tier3);
            }
        }
    }
}

#[test]
fn data_loss_and_security_are_critical() {
    let guardrail = [None, Some(Severity::Low), Some(Severity::Medium), Some(Severity::High)];
    for issue in issue_options() {
        for users in [0, 1, 6, 100] {
            for blocking in [false, true] {
                for g in guardrail {
                    assert_eq!(
                        classify_severity(issue, users, blocking, true, false, g),
                        Severity::Critical
                    );
                    assert_eq!(
                        classify_severity(issue, users, blocking, false, true, g),
                        Severity::Critical
                    );
                }
            }
        }
    }
}

#[test]
fn severity_rank_supports_threshold_checks() {
    assert!(Severity::High >= Severity::Medium);
    assert!(Severity::Critical >= Severity::Medium);
    assert!(Severity::Low < Severity::Medium);
}

#[test]
fn tier_does_not_depend_on_role() {
    // Messages that no guardrail or role filter touches.
    let messages = [
        "I forgot my password",
        "the lab froze and I lost work",
        "everyone is stuck on the wrong environment",
        "what are the lab hours",
    ];
    let config = PipelineConfig::default();
    let chunks = vec![doc_chunk("faq", "FAQ", "1", 1, "general answers")];
    for msg in messages {
        let tiers: Vec<Tier> = Role::all()
            .iter()
            .map(|role| {
                assess(
                    TriageRequest {
                        message: msg,
                        role: *role,
                        resolution_attempts: 1,
                        candidates: chunks.clone(),
                    },
                    &config,
                )
                .tier
            })
            .collect();
        assert!(tiers.windows(2).all(|w| w[0] == w[1]), "{msg}: {tiers:?}");
    }
}

#[test]
fn deflections_never_echo_blocked_vocabulary() {
    let samples: &[(GuardrailCategory, &str, &[&str])] = &[
        (
            GuardrailCategory::HostAccess,
            "give me hypervisor access so I can ssh into the host",
            &["hypervisor", "host", "ssh", "escape", "machine"],
        ),
        (
            GuardrailCategory::DisableLogging,
            "how do I disable logging and hide activity",
            &["disable", "logging", "log ", "hide", "activity", "monitor", "bypass"],
        ),
        (
            GuardrailCategory::KernelDebug,
            "I need kgdb for kernel debug",
            &["kernel", "debug", "kgdb", "driver", "module"],
        ),
        (
            GuardrailCategory::EtcHosts,
            "edit /etc/hosts for me",
            &["/etc/hosts", "hosts", "edit"],
        ),
        (
            GuardrailCategory::Destructive,
            "destroy all the labs and wipe all vms",
            &["destroy", "wipe", "delete", "reset", "environment"],
        ),
    ];
    for (category, message, sensitive) in samples {
        let verdict = guardrail_check(message, Role::Admin);
        assert_eq!(verdict.category, Some(*category), "{message}");
        let text = verdict.deflection_message.unwrap().to_lowercase();
        for term in *sensitive {
            assert!(!text.contains(term), "{category} deflection contains {term:?}");
        }
    }

    for role in [Role::Trainee, Role::Instructor] {
        let verdict = guardrail_check("can I use sudo and iptables", role);
        assert_eq!(verdict.category, Some(GuardrailCategory::RoleRestriction));
        let text = verdict.deflection_message.unwrap().to_lowercase();
        for term in ["sudo", "iptables", "root"] {
            assert!(!text.contains(term));
        }
    }

    // Every table entry carries a non-empty deflection.
    assert!(FORBIDDEN_CATEGORIES.iter().all(|c| !c.deflection.is_empty()));
}

#[test]
fn normalization_is_idempotent() {
    let titles = [
        "Authentication Policy v2.1 (2024) - DEPRECATED",
        "Current VPN Setup Version 3.0",
        "Old Lab Guide (draft) 2019",
        "new   DNS    troubleshooting v4",
        "plain title",
        "",
    ];
    for title in titles {
        let once = normalize_title(title);
        assert_eq!(normalize_title(&once), once);
    }
}

#[test]
fn two_point_one_beats_two_point_zero() {
    let out = resolve_conflicts(vec![
        doc_chunk("01-auth", "Auth", "2.0", 1, "a"),
        doc_chunk("01-auth", "Auth", "2.0", 1, "b"),
        doc_chunk("01-auth", "Auth", "2.1", 15, "c"),
    ]);
    assert!(!out.is_empty());
    assert!(out.iter().all(|c| c.version() == "2.1"));
}

#[test]
fn concurrent_callers_agree() {
    let config = PipelineConfig::default();
    let chunks = sample_chunks();
    let expected: Vec<_> = MESSAGES
        .iter()
        .map(|msg| {
            assess(
                TriageRequest {
                    message: msg,
                    role: Role::Trainee,
                    resolution_attempts: 0,
                    candidates: chunks.clone(),
                },
                &config,
            )
        })
        .collect();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for (msg, want) in MESSAGES.iter().zip(&expected) {
                    let got = assess(
                        TriageRequest {
                            message: msg,
                            role: Role::Trainee,
                            resolution_attempts: 0,
                            candidates: chunks.clone(),
                        },
                        &config,
                    );
                    assert_eq!(&got, want);
                }
            });
        }
    });
}
