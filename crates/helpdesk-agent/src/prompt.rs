//! Grounded prompt construction.
//!
//! The system prompt pins the generator to the retrieved KB text. Without
//! chunks a separate prompt tells it to say the topic is not covered.

use triage::{KbChunk, Role};

use crate::collaborators::{ChatTurn, MessageAuthor, StoredMessage};

const GROUNDED_TEMPLATE: &str = "You are a help desk assistant for the training lab platform.

CRITICAL RULES - YOU MUST FOLLOW THESE EXACTLY:

1. Answer ONLY using the provided KB context below
2. NEVER invent commands, URLs, procedures, or policies
3. If the KB does not cover the issue, explicitly say: \"This issue is not covered in the knowledge base.\"
4. Always cite KB document IDs when providing information
5. Do not use external knowledge or make assumptions
6. If you need clarifying information, ask specific questions
7. Follow the escalation and tiering rules documented in the KB

USER ROLE: {role}

KNOWLEDGE BASE CONTEXT:
{context}

---

Based ONLY on the above KB context, provide a helpful, accurate response to the user's question.
If the KB does not contain the answer, say so explicitly and suggest escalation.
";

pub const NO_KB_SYSTEM_PROMPT: &str = "You are a help desk assistant for the training lab platform.

The knowledge base does not contain information relevant to the user's query.

Your response should:
1. Clearly state: \"This issue is not covered in the knowledge base.\"
2. Suggest that the user's issue will be escalated to a support engineer
3. Ask if there are any other questions you can help with

Do NOT attempt to answer the question or provide guidance without KB coverage.
";

const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

fn format_chunk(chunk: &KbChunk) -> String {
    let heading = if chunk.heading_path.trim().is_empty() {
        "Content"
    } else {
        chunk.heading_path.as_str()
    };
    format!(
        "[Document: {}]\n[Section: {}]\n{}",
        chunk.document_id(),
        heading,
        chunk.text
    )
}

pub fn build_system_prompt(chunks: &[KbChunk], role: Role) -> String {
    if chunks.is_empty() {
        return NO_KB_SYSTEM_PROMPT.to_string();
    }
    let context = chunks
        .iter()
        .map(format_chunk)
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR);
    GROUNDED_TEMPLATE
        .replace("{role}", role.as_str())
        .replace("{context}", &context)
}

/// Map stored messages to generator turns.
pub fn format_history(messages: &[StoredMessage]) -> Vec<ChatTurn> {
    messages
        .iter()
        .map(|m| ChatTurn {
            role: match m.author {
                MessageAuthor::Assistant => "assistant",
                MessageAuthor::User => "user",
            }
            .to_string(),
            content: m.content.clone(),
        })
        .collect()
}
