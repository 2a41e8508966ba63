//! Generator implementations.
//!
//! - [`OpenAiCompatGenerator`]: `POST {url}/chat/completions` on any
//!   OpenAI-compatible server.
//! - [`CannedGenerator`]: fixed answer, used when no endpoint is configured.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::collaborators::{ChatTurn, Generator};
use crate::config::LlmEndpoint;
use crate::errors::GenerationError;

const MAX_TOKENS: u32 = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const CANNED_ANSWER: &str = "Based on the knowledge base, I can help you with that issue. Please follow the documented troubleshooting steps.";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Thin adapter over an OpenAI-compatible chat completions endpoint.
pub struct OpenAiCompatGenerator {
    client: reqwest::Client,
    endpoint: LlmEndpoint,
}

impl OpenAiCompatGenerator {
    pub fn new(endpoint: LlmEndpoint) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, endpoint })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.url.trim_end_matches('/'))
    }
}

fn build_messages<'a>(
    system_prompt: &'a str,
    user_message: &'a str,
    history: &'a [ChatTurn],
) -> Vec<WireMessage<'a>> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(WireMessage {
        role: "system",
        content: system_prompt,
    });
    messages.extend(history.iter().map(|t| WireMessage {
        role: &t.role,
        content: &t.content,
    }));
    messages.push(WireMessage {
        role: "user",
        content: user_message,
    });
    messages
}

fn first_answer(response: CompletionResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

#[async_trait]
impl Generator for OpenAiCompatGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        history: &[ChatTurn],
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let body = CompletionRequest {
            model: &self.endpoint.model,
            messages: build_messages(system_prompt, user_message, history),
            temperature,
            max_tokens: MAX_TOKENS,
        };

        let mut request = self.client.post(self.completions_url()).json(&body);
        if let Some(key) = &self.endpoint.api_key {
            request = request.bearer_auth(key);
        }

        debug!(model = %self.endpoint.model, turns = body.messages.len(), "sending completion request");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "completion endpoint returned error");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response.json().await?;
        first_answer(parsed)
    }
}

/// Fixed reply that defers to the knowledge base.
#[derive(Debug, Clone, Default)]
pub struct CannedGenerator;

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(
        &self,
        _system_prompt: &str,
        _user_message: &str,
        _history: &[ChatTurn],
        _temperature: f32,
    ) -> Result<String, GenerationError> {
        Ok(CANNED_ANSWER.to_string())
    }
}

/// Pick the generator for an optional endpoint.
pub fn from_endpoint(endpoint: Option<&LlmEndpoint>) -> Result<Box<dyn Generator>, GenerationError> {
    match endpoint {
        Some(ep) => Ok(Box::new(OpenAiCompatGenerator::new(ep.clone())?)),
        None => Ok(Box::new(CannedGenerator)),
    }
}
