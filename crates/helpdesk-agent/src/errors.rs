//! Error taxonomy for the orchestrator and its collaborators.
//!
//! Collaborators report [`CollaboratorError`]; the generator reports
//! [`GenerationError`]. The orchestrator maps collaborator failures into
//! [`AgentError`] by the stage they happened in. Generation failures never
//! become an `AgentError`: the orchestrator answers with a fallback instead.

use thiserror::Error;

/// Failure reported by a retriever, store, ticket sink or event log.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Backend could not be reached or refused the call.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// Data came back in a shape the caller cannot use.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Failure of the text-generation call.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Request never completed (connect, timeout, body read).
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status.
    #[error("Endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Well-formed reply with nothing to say.
    #[error("Response contained no choices")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Errors surfaced to callers of the orchestrator.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The request failed validation; nothing was processed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[source] CollaboratorError),

    /// Conversation, ticket or event storage failed.
    #[error("Persistence failed: {0}")]
    Persistence(#[source] CollaboratorError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AgentError {
    /// Whether the caller is at fault (as opposed to a backend).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}
