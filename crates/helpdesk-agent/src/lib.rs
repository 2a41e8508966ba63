//! Helpdesk Agent
//!
//! Async orchestration around the `triage` decision pipeline. The crate owns
//! no storage, search index or model: retrieval, generation, conversation
//! history, ticketing and event logging are collaborator traits, with
//! in-memory implementations for the CLI and tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! let orchestrator = HelpdeskOrchestrator::new(config, collaborators)?;
//! let response = orchestrator
//!     .handle(&ChatRequest::new("session-1", "My lab won't start", Role::Trainee))
//!     .await?;
//! println!("{} ({})", response.answer, response.tier);
//! ```

pub mod collaborators;
pub mod config;
pub mod errors;
pub mod generator;
pub mod memory;
pub mod orchestrator;
pub mod prompt;
pub mod response;

pub use collaborators::{
    ChatTurn, ConversationStore, EventKind, EventLog, Generator, MessageAuthor, MessageMetadata,
    NewTicket, Retriever, StoredMessage, SupportEvent, TicketSink,
};
pub use config::{AgentConfig, LlmEndpoint};
pub use errors::{AgentError, CollaboratorError, GenerationError};
pub use generator::{CannedGenerator, OpenAiCompatGenerator};
pub use memory::{
    InMemoryConversationStore, InMemoryEventLog, InMemoryKnowledgeBase, InMemoryTicketSink,
    KnowledgeBaseFile,
};
pub use orchestrator::{Collaborators, HelpdeskOrchestrator};
pub use response::{ChatContext, ChatRequest, ChatResponse, GuardrailSummary, KbReference};
