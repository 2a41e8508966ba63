//! Issue Classifier: keyword cascade over the message, then chunk hints.

use tracing::debug;

use crate::kb::KbChunk;
use crate::patterns::{ISSUE_KEYWORDS, MULTI_USER_PHRASES};
use crate::types::IssueType;

/// Tag the request with exactly one issue type.
///
/// Groups are tried in table order (critical, technical, basic) and the first
/// substring hit wins. Without a hit, retrieved chunk text can still point at
/// a kernel panic or a container init failure. Falls back to
/// [`IssueType::GeneralQuestion`].
pub fn detect_issue_type(message: &str, chunks: &[KbChunk]) -> IssueType {
    let lowered = message.to_lowercase();
    for (issue, keywords) in ISSUE_KEYWORDS {
        if let Some(kw) = keywords.iter().find(|kw| lowered.contains(*kw)) {
            debug!(issue = %issue, keyword = kw, "issue type from message");
            return *issue;
        }
    }

    for chunk in chunks {
        let text = chunk.text.to_lowercase();
        if text.contains("kernel panic") {
            debug!(issue = %IssueType::KernelPanic, doc = chunk.document_id(), "issue type from kb hint");
            return IssueType::KernelPanic;
        }
        if text.contains("container") && text.contains("init") {
            debug!(issue = %IssueType::ContainerInitFailure, doc = chunk.document_id(), "issue type from kb hint");
            return IssueType::ContainerInitFailure;
        }
    }

    IssueType::GeneralQuestion
}

pub fn detect_multiple_users_affected(message: &str) -> bool {
    let lowered = message.to_lowercase();
    MULTI_USER_PHRASES.iter().any(|p| lowered.contains(p))
}
