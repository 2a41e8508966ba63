//! Lenient semantic-version-like parsing for document versions.
//!
//! `DocVersion::parse` never fails. Anything it cannot read becomes
//! [`DocVersion::Unparsed`], which orders below every parsed version so a
//! malformed revision can never win a conflict against a well-formed one.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocVersion {
    Unparsed,
    Parsed {
        /// Numeric release components with trailing zeros removed.
        release: Vec<u64>,
        /// Dot-separated prerelease identifiers, if any.
        pre: Option<Vec<String>>,
    },
}

impl DocVersion {
    /// Accepts `v2`, `2.1`, `2.1.0-rc.1`, `3.0+build.7`.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        let s = s.strip_prefix(['v', 'V']).unwrap_or(s);
        // Build metadata is ignored entirely.
        let s = s.split_once('+').map_or(s, |(head, _)| head);
        let (release_part, pre_part) = match s.split_once('-') {
            Some((r, p)) => (r, Some(p)),
            None => (s, None),
        };

        let mut release = Vec::new();
        for component in release_part.split('.') {
            match component.parse::<u64>() {
                Ok(n) if !component.is_empty() => release.push(n),
                _ => return Self::Unparsed,
            }
        }
        while release.last() == Some(&0) {
            release.pop();
        }

        let pre = match pre_part {
            None => None,
            Some(p) => {
                let ids: Vec<String> = p.split('.').map(str::to_string).collect();
                if ids.iter().any(|id| id.is_empty()) {
                    return Self::Unparsed;
                }
                Some(ids)
            }
        };

        Self::Parsed { release, pre }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }
}

fn cmp_identifier(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn cmp_pre(a: &Option<Vec<String>>, b: &Option<Vec<String>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        // A release outranks any of its prereleases.
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = cmp_identifier(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
    }
}

impl PartialOrd for DocVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DocVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Unparsed, Self::Unparsed) => Ordering::Equal,
            (Self::Unparsed, Self::Parsed { .. }) => Ordering::Less,
            (Self::Parsed { .. }, Self::Unparsed) => Ordering::Greater,
            (
                Self::Parsed { release: r1, pre: p1 },
                Self::Parsed { release: r2, pre: p2 },
            ) => r1.cmp(r2).then_with(|| cmp_pre(p1, p2)),
        }
    }
}
