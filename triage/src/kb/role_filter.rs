//! Role Filter: hide privileged KB content from restricted roles.

use tracing::debug;

use super::chunk::KbChunk;
use crate::patterns::{ALLOWED_RESTRICTED_PATH, PRIVILEGED_CONTENT, RESTRICTED_PATH};
use crate::types::Role;

/// True when the text references a privileged command or a restricted
/// system path. `/etc/hosts` is not restricted.
pub fn contains_privileged_content(text: &str) -> bool {
    if PRIVILEGED_CONTENT.iter().any(|re| re.is_match(text)) {
        return true;
    }
    RESTRICTED_PATH.captures_iter(text).any(|caps| {
        let rest = caps.get(1).map_or("", |m| m.as_str());
        !rest
            .get(..ALLOWED_RESTRICTED_PATH.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(ALLOWED_RESTRICTED_PATH))
    })
}

/// Drop chunks a restricted role may not see. Order-preserving; a no-op for
/// unrestricted roles.
pub fn filter_by_role(chunks: Vec<KbChunk>, role: Role) -> Vec<KbChunk> {
    if !role.is_restricted() {
        return chunks;
    }
    let before = chunks.len();
    let kept: Vec<KbChunk> = chunks
        .into_iter()
        .filter(|c| !contains_privileged_content(&c.text))
        .collect();
    if kept.len() != before {
        debug!(role = %role, dropped = before - kept.len(), "role filter removed chunks");
    }
    kept
}
