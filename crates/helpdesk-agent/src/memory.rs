//! In-memory collaborators
//!
//! Provides `InMemoryKnowledgeBase`, `InMemoryConversationStore`,
//! `InMemoryTicketSink` and `InMemoryEventLog` that satisfy the collaborator
//! contracts without any external service. Used by the CLI and by tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use triage::{KbChunk, KbDocument, Role};
use uuid::Uuid;

use crate::collaborators::{
    ConversationStore, EventLog, NewTicket, Retriever, StoredMessage, SupportEvent, TicketSink,
};
use crate::errors::CollaboratorError;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, CollaboratorError> {
    mutex
        .lock()
        .map_err(|_| CollaboratorError::Unavailable("in-memory store lock poisoned".into()))
}

// ---------------------------------------------------------------------------
// KnowledgeBaseFile
// ---------------------------------------------------------------------------

/// Chunk entry in a KB fixture; points at a document by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEntry {
    pub document_id: String,
    /// Selects a revision when several documents share an id.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub heading_path: String,
    pub text: String,
}

/// JSON fixture: documents plus the chunks cut from them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBaseFile {
    pub documents: Vec<KbDocument>,
    pub chunks: Vec<ChunkEntry>,
}

impl KnowledgeBaseFile {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge base {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse knowledge base {}", path.display()))
    }

    /// Join every chunk entry to its document.
    pub fn into_chunks(self) -> Result<Vec<KbChunk>, CollaboratorError> {
        let KnowledgeBaseFile { documents, chunks } = self;
        chunks
            .into_iter()
            .map(|entry| {
                let document = documents
                    .iter()
                    .find(|d| {
                        d.id == entry.document_id
                            && entry.version.as_ref().map_or(true, |v| *v == d.version)
                    })
                    .cloned()
                    .ok_or_else(|| {
                        CollaboratorError::InvalidData(format!(
                            "chunk references unknown document {}",
                            entry.document_id
                        ))
                    })?;
                Ok(KbChunk::new(document, entry.heading_path, entry.text))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// InMemoryKnowledgeBase
// ---------------------------------------------------------------------------

/// Keyword-overlap retriever. Deterministic stand-in for vector search.
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeBase {
    chunks: Vec<KbChunk>,
}

impl InMemoryKnowledgeBase {
    pub fn new(chunks: Vec<KbChunk>) -> Self {
        Self { chunks }
    }

    pub fn from_file(file: KnowledgeBaseFile) -> Result<Self, CollaboratorError> {
        Ok(Self::new(file.into_chunks()?))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3)
        .map(str::to_string)
        .collect()
}

fn overlap(query: &HashSet<String>, chunk: &KbChunk) -> usize {
    let haystack = terms(&format!(
        "{} {} {}",
        chunk.document.title, chunk.heading_path, chunk.text
    ));
    query.intersection(&haystack).count()
}

#[async_trait]
impl Retriever for InMemoryKnowledgeBase {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<KbChunk>, CollaboratorError> {
        let query_terms = terms(query);
        let mut scored: Vec<(usize, &KbChunk)> = self
            .chunks
            .iter()
            .map(|c| (overlap(&query_terms, c), c))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable: equal scores keep load order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, c)| c.clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// InMemoryConversationStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Conversation {
    role: Role,
    messages: Vec<StoredMessage>,
}

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: Mutex<HashMap<String, Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Role the conversation was opened with.
    pub fn role_of(&self, session_id: &str) -> Option<Role> {
        lock(&self.conversations)
            .ok()?
            .get(session_id)
            .map(|c| c.role)
    }

    pub fn message_count(&self, session_id: &str) -> usize {
        lock(&self.conversations)
            .ok()
            .and_then(|c| c.get(session_id).map(|c| c.messages.len()))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn ensure_conversation(&self, session_id: &str, role: Role) -> Result<(), CollaboratorError> {
        lock(&self.conversations)?
            .entry(session_id.to_string())
            .or_insert_with(|| Conversation {
                role,
                messages: Vec::new(),
            });
        Ok(())
    }

    async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<StoredMessage>, CollaboratorError> {
        let conversations = lock(&self.conversations)?;
        Ok(conversations
            .get(session_id)
            .map(|c| {
                let start = c.messages.len().saturating_sub(limit);
                c.messages[start..].to_vec()
            })
            .unwrap_or_default())
    }

    async fn append(&self, session_id: &str, message: StoredMessage) -> Result<(), CollaboratorError> {
        let mut conversations = lock(&self.conversations)?;
        let conversation = conversations.get_mut(session_id).ok_or_else(|| {
            CollaboratorError::InvalidData(format!("no conversation for session {session_id}"))
        })?;
        conversation.messages.push(message);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InMemoryTicketSink
// ---------------------------------------------------------------------------

/// `INC-` followed by the first eight hex digits of the uuid, uppercased.
pub fn ticket_id(uuid: Uuid) -> String {
    let hex = uuid.simple().to_string();
    format!("INC-{}", hex[..8].to_uppercase())
}

#[derive(Debug, Default)]
pub struct InMemoryTicketSink {
    tickets: Mutex<Vec<(String, NewTicket)>>,
}

impl InMemoryTicketSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of opened tickets with their ids.
    pub fn tickets(&self) -> Vec<(String, NewTicket)> {
        lock(&self.tickets).map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TicketSink for InMemoryTicketSink {
    async fn open_ticket(&self, ticket: NewTicket) -> Result<String, CollaboratorError> {
        let id = ticket_id(Uuid::new_v4());
        lock(&self.tickets)?.push((id.clone(), ticket));
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// InMemoryEventLog
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: Mutex<Vec<SupportEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SupportEvent> {
        lock(&self.events).map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn record(&self, event: SupportEvent) -> Result<(), CollaboratorError> {
        lock(&self.events)?.push(event);
        Ok(())
    }
}
