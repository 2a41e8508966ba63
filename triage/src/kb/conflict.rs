//! KB Conflict Resolver: keep one authoritative revision per topic
//!
//! Retrieval can return chunks from several documents that cover the same
//! topic (an old and a new policy, two revisions of one article). Those are
//! grouped, ranked by `(version, last_updated)` and only the winner's chunks
//! survive.
//!
//! Revisions are grouped when any of these hold:
//! - they share a document id (different versions of one document)
//! - both ids belong to the policy family (see [`POLICY_FAMILY_ID`])
//! - their normalized titles are equal and non-empty
//!
//! Grouping is transitive: overlapping groups are merged, so exactly one
//! revision survives per connected component.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chunk::{KbChunk, KbDocument, RevisionKey};
use super::version::DocVersion;
use crate::patterns::{POLICY_FAMILY_ID, TITLE_STRIP_PATTERNS, WHITESPACE_RUN};

/// Strip version markers, years, parentheticals and status words, then
/// lowercase and collapse whitespace. Idempotent.
pub fn normalize_title(title: &str) -> String {
    let mut out = title.to_string();
    for re in TITLE_STRIP_PATTERNS.iter() {
        out = re.replace_all(&out, " ").into_owned();
    }
    WHITESPACE_RUN
        .replace_all(out.trim(), " ")
        .to_lowercase()
}

fn is_policy_family(id: &str) -> bool {
    POLICY_FAMILY_ID.is_match(id)
}

/// Minimal union-find over revision indices.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Union keeps the smaller index as root so roots follow first-seen order.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

/// One revision of a document, owned so it can outlive the chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRevision {
    pub id: String,
    pub version: String,
    pub last_updated: NaiveDate,
}

impl From<&KbDocument> for DocumentRevision {
    fn from(doc: &KbDocument) -> Self {
        Self {
            id: doc.id.clone(),
            version: doc.version.clone(),
            last_updated: doc.last_updated,
        }
    }
}

impl std::fmt::Display for DocumentRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} version {} ({})", self.id, self.version, self.last_updated)
    }
}

/// Why the winner outranked the runner-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    NewerVersion,
    MoreRecentlyUpdated,
    /// Version and date tie; the revision retrieved first is kept.
    FirstRetrieved,
}

/// How one conflict group of two or more revisions was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub winner: DocumentRevision,
    /// Losing revisions, best first.
    pub superseded: Vec<DocumentRevision>,
    pub reason: WinReason,
}

impl ConflictResolution {
    /// One-line explanation for audit logs.
    pub fn explanation(&self) -> String {
        let why = match self.reason {
            WinReason::NewerVersion => "newer version",
            WinReason::MoreRecentlyUpdated => "same version, more recently updated",
            WinReason::FirstRetrieved => "same version and date, retrieved first",
        };
        let superseded = self
            .superseded
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("Kept {} ({}); superseded {}", self.winner, why, superseded)
    }
}

/// Drop chunks belonging to superseded revisions. Surviving chunks keep their
/// input order. Never fails: unparsable versions simply rank lowest.
pub fn resolve_conflicts(chunks: Vec<KbChunk>) -> Vec<KbChunk> {
    resolve_conflicts_with_report(chunks).0
}

/// [`resolve_conflicts`] plus one [`ConflictResolution`] per group that had
/// more than one revision, in first-seen group order.
pub fn resolve_conflicts_with_report(
    chunks: Vec<KbChunk>,
) -> (Vec<KbChunk>, Vec<ConflictResolution>) {
    if chunks.len() < 2 {
        return (chunks, Vec::new());
    }

    // Distinct revisions in first-seen order.
    let mut revisions: Vec<&KbDocument> = Vec::new();
    let mut index_of: HashMap<RevisionKey<'_>, usize> = HashMap::new();
    let mut chunk_revision: Vec<usize> = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let key = chunk.revision();
        let idx = *index_of.entry(key).or_insert_with(|| {
            revisions.push(&chunk.document);
            revisions.len() - 1
        });
        chunk_revision.push(idx);
    }

    let mut sets = DisjointSet::new(revisions.len());
    let mut first_by_id: HashMap<&str, usize> = HashMap::new();
    let mut first_by_title: HashMap<String, usize> = HashMap::new();
    let mut first_in_family: Option<usize> = None;

    for (idx, doc) in revisions.iter().enumerate() {
        if let Some(&other) = first_by_id.get(doc.id.as_str()) {
            sets.union(idx, other);
        } else {
            first_by_id.insert(&doc.id, idx);
        }

        if is_policy_family(&doc.id) {
            match first_in_family {
                Some(other) => sets.union(idx, other),
                None => first_in_family = Some(idx),
            }
        }

        let title = normalize_title(&doc.title);
        if !title.is_empty() {
            if let Some(&other) = first_by_title.get(&title) {
                sets.union(idx, other);
            } else {
                first_by_title.insert(title, idx);
            }
        }
    }

    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for idx in 0..revisions.len() {
        let root = sets.find(idx);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(idx),
            None => groups.push((root, vec![idx])),
        }
    }

    let mut keep = vec![false; revisions.len()];
    let mut report = Vec::new();
    for (_, members) in &groups {
        if members.len() == 1 {
            keep[members[0]] = true;
            continue;
        }
        let mut ranked: Vec<(usize, DocVersion)> = members
            .iter()
            .map(|&i| (i, DocVersion::parse(&revisions[i].version)))
            .collect();
        // Stable: full ties keep first-seen order.
        ranked.sort_by(|(ia, va), (ib, vb)| {
            vb.cmp(va)
                .then_with(|| revisions[*ib].last_updated.cmp(&revisions[*ia].last_updated))
        });

        let (winner, winner_version) = &ranked[0];
        let (runner_up, runner_up_version) = &ranked[1];
        let reason = if winner_version != runner_up_version {
            WinReason::NewerVersion
        } else if revisions[*winner].last_updated != revisions[*runner_up].last_updated {
            WinReason::MoreRecentlyUpdated
        } else {
            WinReason::FirstRetrieved
        };
        keep[*winner] = true;

        let resolution = ConflictResolution {
            winner: DocumentRevision::from(revisions[*winner]),
            superseded: ranked[1..]
                .iter()
                .map(|(i, _)| DocumentRevision::from(revisions[*i]))
                .collect(),
            reason,
        };
        debug!(explanation = %resolution.explanation(), "kb conflict resolved");
        report.push(resolution);
    }

    let kept: Vec<bool> = chunk_revision.iter().map(|&i| keep[i]).collect();
    let chunks = chunks
        .into_iter()
        .zip(kept)
        .filter_map(|(chunk, k)| k.then_some(chunk))
        .collect();
    (chunks, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, title: &str, version: &str, updated: &str, text: &str) -> KbChunk {
        KbChunk::new(
            KbDocument {
                id: id.into(),
                title: title.into(),
                version: version.into(),
                last_updated: NaiveDate::parse_from_str(updated, "%Y-%m-%d").unwrap(),
                tags: vec![],
            },
            "",
            text,
        )
    }

    fn versions(chunks: &[KbChunk]) -> Vec<(&str, &str)> {
        chunks.iter().map(|c| (c.document_id(), c.version())).collect()
    }

    #[test]
    fn test_normalize_title_strips_markers() {
        assert_eq!(
            normalize_title("Authentication Policy v2.1 (2024) - DEPRECATED"),
            "authentication policy -"
        );
        assert_eq!(normalize_title("Lab Guide Version 3"), "lab guide");
        assert_eq!(normalize_title("New   VPN   Setup v2"), "vpn setup");
        assert_eq!(normalize_title("Password Reset (old)"), "password reset");
    }

    #[test]
    fn test_normalize_title_idempotent() {
        for title in [
            "Authentication Policy v2.1 (2024) - DEPRECATED",
            "Current DNS Troubleshooting 2023",
            "  Lab   Guide  ",
            "version 1.2.3 of the thing (draft) new",
        ] {
            let once = normalize_title(title);
            assert_eq!(normalize_title(&once), once, "{title}");
        }
    }

    #[test]
    fn test_same_id_newer_version_wins() {
        let out = resolve_conflicts(vec![
            chunk("01-auth", "Auth", "2.0", "2023-12-01", "old"),
            chunk("01-auth", "Auth", "2.1", "2024-01-15", "new"),
        ]);
        assert_eq!(versions(&out), vec![("01-auth", "2.1")]);
    }

    #[test]
    fn test_policy_family_grouping() {
        let out = resolve_conflicts(vec![
            chunk("auth-policy-2023", "Login rules", "1.0", "2023-01-01", "a"),
            chunk("authentication-policy", "Sign-in standard", "2.0", "2024-02-01", "b"),
            chunk("authentication-policy", "Sign-in standard", "2.0", "2024-02-01", "c"),
        ]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.document_id() == "authentication-policy"));
    }

    #[test]
    fn test_title_grouping_across_ids() {
        let out = resolve_conflicts(vec![
            chunk("dns-old", "DNS Troubleshooting (deprecated)", "1.0", "2022-05-01", "x"),
            chunk("dns-new", "DNS Troubleshooting 2024", "1.0", "2024-05-01", "y"),
            chunk("vpn", "VPN Setup", "1.0", "2020-01-01", "z"),
        ]);
        // Equal versions: the newer date wins; unrelated doc untouched.
        assert_eq!(versions(&out), vec![("dns-new", "1.0"), ("vpn", "1.0")]);
    }

    #[test]
    fn test_unparsable_version_loses() {
        let out = resolve_conflicts(vec![
            chunk("guide", "Guide", "latest", "2025-01-01", "a"),
            chunk("guide", "Guide", "0.1", "2020-01-01", "b"),
        ]);
        assert_eq!(versions(&out), vec![("guide", "0.1")]);
    }

    #[test]
    fn test_full_tie_keeps_first_seen() {
        let out = resolve_conflicts(vec![
            chunk("a", "Same Topic", "1.0", "2024-01-01", "first"),
            chunk("b", "Same Topic", "1.0", "2024-01-01", "second"),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "first");
    }

    #[test]
    fn test_overlapping_groups_merge() {
        // x shares an id with y, y shares a title with z: one component.
        let out = resolve_conflicts(vec![
            chunk("x", "Alpha", "1.0", "2024-01-01", "x1"),
            chunk("x", "Beta", "2.0", "2024-01-01", "x2"),
            chunk("z", "Beta", "3.0", "2024-01-01", "z3"),
        ]);
        assert_eq!(versions(&out), vec![("z", "3.0")]);
    }

    #[test]
    fn test_singletons_and_order_preserved() {
        let input = vec![
            chunk("c", "Charlie", "1", "2024-01-01", "1"),
            chunk("a", "Alpha", "1", "2024-01-01", "2"),
            chunk("c", "Charlie", "1", "2024-01-01", "3"),
            chunk("b", "Bravo", "1", "2024-01-01", "4"),
        ];
        let out = resolve_conflicts(input.clone());
        assert_eq!(out, input);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(resolve_conflicts(vec![]).is_empty());
        let one = vec![chunk("a", "A", "x", "2024-01-01", "t")];
        assert_eq!(resolve_conflicts(one.clone()), one);
    }

    #[test]
    fn test_report_names_winning_version() {
        let (out, report) = resolve_conflicts_with_report(vec![
            chunk("01-auth", "Auth", "2.0", "2023-12-01", "old"),
            chunk("01-auth", "Auth", "2.1", "2024-01-15", "new"),
        ]);
        assert_eq!(versions(&out), vec![("01-auth", "2.1")]);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].winner.version, "2.1");
        assert_eq!(report[0].superseded.len(), 1);
        assert_eq!(report[0].superseded[0].version, "2.0");
        assert_eq!(report[0].reason, WinReason::NewerVersion);
        let explanation = report[0].explanation();
        assert!(explanation.contains("2.1"));
        assert!(explanation.contains("newer version"));
    }

    #[test]
    fn test_report_reasons_for_ties() {
        let (_, by_date) = resolve_conflicts_with_report(vec![
            chunk("dns-old", "DNS Troubleshooting (deprecated)", "1.0", "2022-05-01", "x"),
            chunk("dns-new", "DNS Troubleshooting 2024", "1.0", "2024-05-01", "y"),
        ]);
        assert_eq!(by_date[0].reason, WinReason::MoreRecentlyUpdated);
        assert_eq!(by_date[0].winner.id, "dns-new");

        let (_, tie) = resolve_conflicts_with_report(vec![
            chunk("a", "Same Topic", "1.0", "2024-01-01", "first"),
            chunk("b", "Same Topic", "1.0", "2024-01-01", "second"),
        ]);
        assert_eq!(tie[0].reason, WinReason::FirstRetrieved);
        assert_eq!(tie[0].winner.id, "a");
    }

    #[test]
    fn test_no_report_without_conflicts() {
        let input = vec![
            chunk("a", "Alpha", "1", "2024-01-01", "1"),
            chunk("a", "Alpha", "1", "2024-01-01", "2"),
            chunk("b", "Bravo", "1", "2024-01-01", "3"),
        ];
        let (out, report) = resolve_conflicts_with_report(input.clone());
        assert_eq!(out, input);
        assert!(report.is_empty());
    }
}
