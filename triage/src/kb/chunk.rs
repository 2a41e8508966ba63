//! Reference chunks and their parent documents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source document a chunk was cut from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbDocument {
    pub id: String,
    pub title: String,
    /// Free-form version string; parsed lazily via [`super::DocVersion`].
    pub version: String,
    pub last_updated: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl KbDocument {
    pub fn revision(&self) -> RevisionKey<'_> {
        RevisionKey {
            id: &self.id,
            version: &self.version,
            last_updated: self.last_updated,
        }
    }
}

/// Identity of one revision of a document. Chunks sharing an id but not a
/// version are different revisions of the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevisionKey<'a> {
    pub id: &'a str,
    pub version: &'a str,
    pub last_updated: NaiveDate,
}

/// A unit of retrieved reference text. Immutable once retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbChunk {
    pub document: KbDocument,
    pub text: String,
    #[serde(default)]
    pub heading_path: String,
}

impl KbChunk {
    pub fn new(document: KbDocument, heading_path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document,
            text: text.into(),
            heading_path: heading_path.into(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document.id
    }

    pub fn version(&self) -> &str {
        &self.document.version
    }

    pub fn last_updated(&self) -> NaiveDate {
        self.document.last_updated
    }

    pub fn revision(&self) -> RevisionKey<'_> {
        self.document.revision()
    }
}
