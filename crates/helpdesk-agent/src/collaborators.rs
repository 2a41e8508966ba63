//! External collaborator contracts.
//!
//! The orchestrator owns no storage, search or model. Everything it talks to
//! sits behind one of these traits so production backends and in-memory
//! fakes plug in the same way. Implementations own their own retry and
//! timeout policy; the orchestrator calls each method once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triage::{GuardrailCategory, IssueType, KbChunk, Role, Severity, Tier};

use crate::errors::{CollaboratorError, GenerationError};

/// Author of a stored conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageAuthor {
    User,
    Assistant,
}

/// Decision metadata attached to assistant messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub tier: Tier,
    pub severity: Severity,
    pub issue_type: Option<IssueType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub author: MessageAuthor,
    pub content: String,
    pub metadata: Option<MessageMetadata>,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            author: MessageAuthor::User,
            content: content.into(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self {
            author: MessageAuthor::Assistant,
            content: content.into(),
            metadata: Some(metadata),
            created_at: Utc::now(),
        }
    }
}

/// One turn of prompt history as sent to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Ticket to open when a request is escalated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub session_id: String,
    pub tier: Tier,
    pub severity: Severity,
    pub subject: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    GuardrailBlocked,
    NoKbCoverage,
    ChatInteraction,
}

/// Audit / analytics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportEvent {
    pub kind: EventKind,
    pub session_id: String,
    pub category: Option<GuardrailCategory>,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl SupportEvent {
    pub fn new(kind: EventKind, session_id: &str, details: serde_json::Value) -> Self {
        Self {
            kind,
            session_id: session_id.to_string(),
            category: None,
            details,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: Option<GuardrailCategory>) -> Self {
        self.category = category;
        self
    }
}

/// Similarity search over the knowledge base.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `limit` chunks for `query`, best first.
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<KbChunk>, CollaboratorError>;
}

/// Text generation.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        history: &[ChatTurn],
        temperature: f32,
    ) -> Result<String, GenerationError>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create the conversation if it does not exist yet.
    async fn ensure_conversation(&self, session_id: &str, role: Role) -> Result<(), CollaboratorError>;

    /// Most recent `limit` messages, oldest first.
    async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<StoredMessage>, CollaboratorError>;

    async fn append(&self, session_id: &str, message: StoredMessage) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait TicketSink: Send + Sync {
    /// Open a ticket and return its id.
    async fn open_ticket(&self, ticket: NewTicket) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait EventLog: Send + Sync {
    async fn record(&self, event: SupportEvent) -> Result<(), CollaboratorError>;
}
