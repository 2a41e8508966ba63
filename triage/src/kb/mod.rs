//! Knowledge-base chunk handling: data model, version parsing, role
//! filtering and conflict resolution. Everything here works on the
//! in-memory list handed over by the caller; nothing is fetched.

pub mod chunk;
pub mod conflict;
pub mod role_filter;
pub mod version;

pub use chunk::{KbChunk, KbDocument, RevisionKey};
pub use conflict::{
    normalize_title, resolve_conflicts, resolve_conflicts_with_report, ConflictResolution,
    DocumentRevision, WinReason,
};
pub use role_filter::{contains_privileged_content, filter_by_role};
pub use version::DocVersion;
