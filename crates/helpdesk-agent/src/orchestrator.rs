//! Helpdesk orchestrator: runs one support request end to end
//!
//! Fixed order per request:
//! 1. Validate the request
//! 2. Load conversation history and count failed resolution attempts
//! 3. Guardrail screen (blocked requests never reach retrieval or generation)
//! 4. Retrieve candidates and run the triage pipeline
//! 5. No KB coverage → fixed answer, no generation
//! 6. Generate a grounded answer (fallback text on failure)
//! 7. Persist messages, open a ticket when escalating, record events
//! 8. Return the structured response
//!
//! All decisions come from `triage`; this module only moves data between
//! collaborators and never retries a failed call.

use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};
use triage::{assess, screen, Assessment, TriageRequest};

use crate::collaborators::{
    ConversationStore, EventKind, EventLog, Generator, MessageAuthor, MessageMetadata, NewTicket,
    Retriever, StoredMessage, SupportEvent, TicketSink,
};
use crate::config::AgentConfig;
use crate::errors::AgentError;
use crate::prompt::{build_system_prompt, format_history};
use crate::response::{
    confidence_for, references_for, ChatRequest, ChatResponse, GuardrailSummary, KbReference,
};

/// Ticket subjects are cut to this many characters.
pub const SUBJECT_MAX_CHARS: usize = 100;

/// External services the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub retriever: Arc<dyn Retriever>,
    pub generator: Arc<dyn Generator>,
    pub conversations: Arc<dyn ConversationStore>,
    pub tickets: Arc<dyn TicketSink>,
    pub events: Arc<dyn EventLog>,
}

pub struct HelpdeskOrchestrator {
    config: AgentConfig,
    collaborators: Collaborators,
}

/// What the final stage needs to persist and answer.
struct Outcome {
    answer: String,
    confidence: f32,
    references: Vec<KbReference>,
}

impl HelpdeskOrchestrator {
    pub fn new(config: AgentConfig, collaborators: Collaborators) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self {
            config,
            collaborators,
        })
    }

    /// Process one chat request.
    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        request.validate()?;
        let session = request.session_id.as_str();
        let role = request.user_role;
        info!(session, role = %role, "processing chat request");

        let c = &self.collaborators;
        c.conversations
            .ensure_conversation(session, role)
            .await
            .map_err(AgentError::Persistence)?;
        let history = c
            .conversations
            .history(session, self.config.history_limit)
            .await
            .map_err(AgentError::Persistence)?;
        let user_messages: Vec<&str> = history
            .iter()
            .filter(|m| m.author == MessageAuthor::User)
            .map(|m| m.content.as_str())
            .collect();
        let resolution_attempts = triage::signals::count_resolution_attempts(&user_messages);
        info!(messages = history.len(), resolution_attempts, "loaded conversation history");

        if let Some(blocked) = screen(&request.message, role, resolution_attempts) {
            warn!(session, category = ?blocked.verdict.category, "request blocked by guardrail");
            let event = SupportEvent::new(
                EventKind::GuardrailBlocked,
                session,
                json!({ "severity": blocked.severity, "message": request.message }),
            )
            .with_category(blocked.verdict.category);
            self.record(event).await?;

            let answer = blocked
                .verdict
                .deflection_message
                .clone()
                .unwrap_or_else(|| self.config.fallback_answer.clone());
            let outcome = Outcome {
                answer,
                confidence: 1.0,
                references: Vec::new(),
            };
            return self.finish(request, &blocked, outcome).await;
        }

        let candidates = c
            .retriever
            .retrieve(&request.message, self.config.retrieval_limit())
            .await
            .map_err(AgentError::Retrieval)?;
        info!(candidates = candidates.len(), "retrieved kb candidates");

        let assessment = assess(
            TriageRequest {
                message: &request.message,
                role,
                resolution_attempts,
                candidates,
            },
            &self.config.pipeline(),
        );

        if !assessment.kb_coverage {
            warn!(session, "no kb coverage for request");
            self.record(SupportEvent::new(EventKind::NoKbCoverage, session, json!({})))
                .await?;
            let outcome = Outcome {
                answer: self.config.no_coverage_answer.clone(),
                confidence: 0.0,
                references: Vec::new(),
            };
            return self.finish(request, &assessment, outcome).await;
        }

        let answer = self.generate(request, &assessment, &history).await;
        let outcome = Outcome {
            answer,
            confidence: confidence_for(assessment.chunks.len()),
            references: references_for(&assessment.chunks),
        };
        self.finish(request, &assessment, outcome).await
    }

    async fn generate(
        &self,
        request: &ChatRequest,
        assessment: &Assessment,
        history: &[StoredMessage],
    ) -> String {
        let system_prompt = build_system_prompt(&assessment.chunks, request.user_role);
        let start = history.len().saturating_sub(self.config.prompt_history);
        let turns = format_history(&history[start..]);
        match self
            .collaborators
            .generator
            .generate(&system_prompt, &request.message, &turns, self.config.temperature)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "generation failed; using fallback answer");
                self.config.fallback_answer.clone()
            }
        }
    }

    async fn record(&self, event: SupportEvent) -> Result<(), AgentError> {
        self.collaborators
            .events
            .record(event)
            .await
            .map_err(AgentError::Persistence)
    }

    /// Persist the exchange, open a ticket when escalating, build the response.
    async fn finish(
        &self,
        request: &ChatRequest,
        assessment: &Assessment,
        outcome: Outcome,
    ) -> Result<ChatResponse, AgentError> {
        let c = &self.collaborators;
        let session = request.session_id.as_str();

        c.conversations
            .append(session, StoredMessage::user(request.message.clone()))
            .await
            .map_err(AgentError::Persistence)?;
        c.conversations
            .append(
                session,
                StoredMessage::assistant(
                    outcome.answer.clone(),
                    MessageMetadata {
                        tier: assessment.tier,
                        severity: assessment.severity,
                        issue_type: assessment.issue_type,
                    },
                ),
            )
            .await
            .map_err(AgentError::Persistence)?;

        let ticket_id = if assessment.escalation.escalate() {
            let reason = assessment.justification.clone().unwrap_or_default();
            let ticket = NewTicket {
                session_id: session.to_string(),
                tier: assessment.tier,
                severity: assessment.severity,
                subject: request.message.chars().take(SUBJECT_MAX_CHARS).collect(),
                description: format!("Issue: {}\n\nReason: {}", request.message, reason),
            };
            let id = c
                .tickets
                .open_ticket(ticket)
                .await
                .map_err(AgentError::Persistence)?;
            info!(ticket_id = %id, reason = ?assessment.escalation.reason(), "opened ticket");
            Some(id)
        } else {
            None
        };

        self.record(SupportEvent::new(
            EventKind::ChatInteraction,
            session,
            json!({
                "tier": assessment.tier,
                "severity": assessment.severity,
                "escalated": assessment.escalation.escalate(),
                "reason": assessment.escalation.reason(),
                "issue_type": assessment.issue_type,
                "no_escalation_requested": assessment.no_escalation_requested,
                "pattern_table_version": assessment.pattern_table_version,
                "context": request.context,
            }),
        ))
        .await?;

        info!(
            tier = %assessment.tier,
            severity = %assessment.severity,
            escalate = assessment.escalation.escalate(),
            "request complete"
        );

        Ok(ChatResponse {
            answer: outcome.answer,
            kb_references: outcome.references,
            confidence: outcome.confidence,
            tier: assessment.tier,
            severity: assessment.severity,
            needs_escalation: assessment.escalation.escalate(),
            escalation_reason: assessment.escalation.reason(),
            guardrail: GuardrailSummary::from(&assessment.verdict),
            ticket_id,
            session_id: request.session_id.clone(),
        })
    }
}
