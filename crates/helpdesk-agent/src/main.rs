use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use helpdesk_agent::generator::from_endpoint;
use helpdesk_agent::{
    AgentConfig, ChatRequest, Collaborators, HelpdeskOrchestrator, InMemoryConversationStore,
    InMemoryEventLog, InMemoryKnowledgeBase, InMemoryTicketSink, KnowledgeBaseFile, Retriever,
};
use tracing::info;
use triage::{assess, Role, TriageRequest};

#[derive(Parser)]
#[command(name = "helpdesk-agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Triage a support message against a knowledge base", long_about = None)]
struct Cli {
    /// Knowledge base fixture (JSON with `documents` and `chunks`)
    #[arg(long)]
    kb: PathBuf,

    /// Role of the user sending the message
    #[arg(long, default_value = "trainee")]
    role: Role,

    /// Conversation id (default: random)
    #[arg(long)]
    session: Option<String>,

    /// TOML config file; without it HELPDESK_* variables are read
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the triage assessment only, without generation or persistence
    #[arg(long)]
    assess_only: bool,

    /// The support message
    message: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AgentConfig::from_toml_file(path)?,
        None => AgentConfig::from_env().context("Failed to read HELPDESK_* environment")?,
    };

    let kb_file = KnowledgeBaseFile::from_json_file(&cli.kb)?;
    let knowledge_base = InMemoryKnowledgeBase::from_file(kb_file)
        .with_context(|| format!("Invalid knowledge base {}", cli.kb.display()))?;
    info!(chunks = knowledge_base.len(), top_k = config.top_k, "Knowledge base loaded");

    if cli.assess_only {
        let candidates = knowledge_base
            .retrieve(&cli.message, config.retrieval_limit())
            .await?;
        let assessment = assess(
            TriageRequest {
                message: &cli.message,
                role: cli.role,
                resolution_attempts: 0,
                candidates,
            },
            &config.pipeline(),
        );
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    let generator = from_endpoint(config.llm.as_ref()).context("Failed to build generator")?;
    let collaborators = Collaborators {
        retriever: Arc::new(knowledge_base),
        generator: Arc::from(generator),
        conversations: Arc::new(InMemoryConversationStore::new()),
        tickets: Arc::new(InMemoryTicketSink::new()),
        events: Arc::new(InMemoryEventLog::new()),
    };
    let orchestrator = HelpdeskOrchestrator::new(config, collaborators)?;

    let session = cli
        .session
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let request = ChatRequest::new(session, cli.message, cli.role);
    let response = orchestrator.handle(&request).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
