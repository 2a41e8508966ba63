//! Request and response records exchanged with callers (camelCase on the wire).

use serde::{Deserialize, Serialize};
use triage::{
    EscalationReason, GuardrailCategory, GuardrailVerdict, KbChunk, RevisionKey, Role, Severity,
    Tier,
};

use crate::errors::AgentError;

/// References returned with an answer.
pub const MAX_REFERENCES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    pub user_role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ChatContext>,
}

/// Where the request came from. Recorded with the interaction event only;
/// it never influences triage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatContext {
    pub module: Option<String>,
    pub channel: Option<String>,
    pub environment: Option<String>,
}

impl ChatRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>, user_role: Role) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            user_role,
            context: None,
        }
    }

    pub fn with_context(mut self, context: ChatContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.session_id.trim().is_empty() {
            return Err(AgentError::InvalidRequest("sessionId must not be empty".into()));
        }
        if self.message.trim().is_empty() {
            return Err(AgentError::InvalidRequest("message must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KbReference {
    pub id: String,
    pub title: String,
    pub version: String,
}

/// Up to [`MAX_REFERENCES`] references, one per revision, in ranked order.
pub fn references_for(chunks: &[KbChunk]) -> Vec<KbReference> {
    let mut seen: Vec<RevisionKey<'_>> = Vec::new();
    let mut refs = Vec::new();
    for chunk in chunks {
        if refs.len() == MAX_REFERENCES {
            break;
        }
        let key = chunk.revision();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        refs.push(KbReference {
            id: chunk.document.id.clone(),
            title: chunk.document.title.clone(),
            version: chunk.document.version.clone(),
        });
    }
    refs
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailSummary {
    pub blocked: bool,
    pub reason: Option<String>,
    pub trigger_type: Option<GuardrailCategory>,
    pub severity: Option<Severity>,
}

impl From<&GuardrailVerdict> for GuardrailSummary {
    fn from(verdict: &GuardrailVerdict) -> Self {
        Self {
            blocked: verdict.blocked,
            reason: verdict.deflection_message.clone(),
            trigger_type: verdict.category,
            severity: verdict.severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub answer: String,
    pub kb_references: Vec<KbReference>,
    /// 0.0 ..= 1.0
    pub confidence: f32,
    pub tier: Tier,
    pub severity: Severity,
    pub needs_escalation: bool,
    pub escalation_reason: Option<EscalationReason>,
    pub guardrail: GuardrailSummary,
    pub ticket_id: Option<String>,
    pub session_id: String,
}

/// 0.9 with three or more supporting chunks, otherwise 0.7.
pub fn confidence_for(chunk_count: usize) -> f32 {
    if chunk_count >= 3 {
        0.9
    } else {
        0.7
    }
}
