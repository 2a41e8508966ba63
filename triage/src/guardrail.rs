//! Guardrail Engine: blocks forbidden requests before any answer is produced
//!
//! Pure function of `(message, role)`. Forbidden categories are evaluated in
//! table order and the first hit wins; there is no scoring. Restricted roles
//! get an extra whole-word token check afterwards.

use tracing::{debug, warn};

use crate::patterns::{role_restriction_deflection, COMPILED_CATEGORIES, COMPILED_ROLE_TERMS};
use crate::types::{GuardrailCategory, GuardrailVerdict, Role, Severity};

/// Check a message against the forbidden-content tables.
pub fn check(message: &str, role: Role) -> GuardrailVerdict {
    for compiled in COMPILED_CATEGORIES.iter() {
        if let Some(hit) = compiled.regexes.iter().find(|re| re.is_match(message)) {
            let source = compiled.source;
            warn!(
                category = %source.category,
                severity = %source.severity,
                role = %role,
                pattern = hit.as_str(),
                "guardrail blocked request"
            );
            return GuardrailVerdict::blocked(source.category, source.severity, source.deflection);
        }
    }

    if role.is_restricted() {
        if let Some(term) = restricted_term(message, role) {
            warn!(
                category = %GuardrailCategory::RoleRestriction,
                role = %role,
                term,
                "guardrail blocked restricted command"
            );
            return GuardrailVerdict::blocked(
                GuardrailCategory::RoleRestriction,
                Severity::Medium,
                role_restriction_deflection(role),
            );
        }
    }

    debug!(role = %role, "guardrail passed");
    GuardrailVerdict::allowed()
}

/// Alias matching the published function name.
pub fn guardrail_check(message: &str, role: Role) -> GuardrailVerdict {
    check(message, role)
}

fn restricted_term(message: &str, role: Role) -> Option<&'static str> {
    COMPILED_ROLE_TERMS
        .iter()
        .find(|(r, _)| *r == role)
        .and_then(|(_, terms)| {
            terms
                .iter()
                .find(|(_, re)| re.is_match(message))
                .map(|(term, _)| *term)
        })
}
