use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use triage::PipelineConfig;

use crate::errors::AgentError;

pub const DEFAULT_FALLBACK_ANSWER: &str = "I apologize, but I'm having trouble processing your request. Please try again or contact support.";
pub const DEFAULT_NO_COVERAGE_ANSWER: &str =
    "This issue is not covered in the knowledge base. A support engineer will assist you.";

/// OpenAI-compatible generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmEndpoint {
    /// Base URL, e.g. `http://localhost:8080/v1`.
    pub url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Orchestrator configuration. Built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Chunks kept after filtering; twice this many are retrieved.
    pub top_k: usize,
    /// Stored messages loaded to count resolution attempts.
    pub history_limit: usize,
    /// Stored messages forwarded to the generator.
    pub prompt_history: usize,
    pub temperature: f32,
    /// No endpoint means the canned generator is used.
    pub llm: Option<LlmEndpoint>,
    pub fallback_answer: String,
    pub no_coverage_answer: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            history_limit: 10,
            prompt_history: 5,
            temperature: 0.0,
            llm: None,
            fallback_answer: DEFAULT_FALLBACK_ANSWER.into(),
            no_coverage_answer: DEFAULT_NO_COVERAGE_ANSWER.into(),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl AgentConfig {
    /// Read `HELPDESK_*` variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            top_k: env_or("HELPDESK_TOP_K", defaults.top_k)?,
            history_limit: env_or("HELPDESK_HISTORY_LIMIT", defaults.history_limit)?,
            prompt_history: env_or("HELPDESK_PROMPT_HISTORY", defaults.prompt_history)?,
            temperature: env_or("HELPDESK_TEMPERATURE", defaults.temperature)?,
            llm: Self::llm_from_env(),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    fn llm_from_env() -> Option<LlmEndpoint> {
        let url = std::env::var("HELPDESK_LLM_URL").ok()?;
        let model = std::env::var("HELPDESK_LLM_MODEL").unwrap_or_else(|_| "gpt-4".into());
        let api_key = std::env::var("HELPDESK_LLM_API_KEY").ok();
        Some(LlmEndpoint {
            url,
            model,
            api_key,
        })
    }

    /// Load from a TOML file; missing fields take their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.top_k == 0 {
            return Err(AgentError::Configuration("top_k must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::Configuration(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        if let Some(llm) = &self.llm {
            if llm.url.trim().is_empty() {
                return Err(AgentError::Configuration("llm.url is empty".into()));
            }
        }
        Ok(())
    }

    /// Settings for the pure triage pipeline.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig { top_k: self.top_k }
    }

    /// How many candidates to ask the retriever for. Extra headroom covers
    /// chunks removed by role filtering and conflict resolution.
    pub fn retrieval_limit(&self) -> usize {
        self.top_k.saturating_mul(2)
    }
}
