//! Consolidation of raw conversation history into display-ready turns.
//!
//! Pure and stateless: given the flat ordered message list from the agent
//! state store, drop what end users never see (system and tool entries) and
//! merge runs of consecutive assistant chunks into single assistant turns.
//! Used for history replay on page load; the live path streams chunks
//! individually over SSE instead.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::domains::chat::model::{DisplayTurn, MessageRole, StoredMessage};

/// Consolidate a flat message list into display-ready turns.
///
/// Idempotent on already-consolidated input: with no adjacent chunks left,
/// every entry passes through unchanged.
pub fn consolidate(messages: &[StoredMessage]) -> Vec<DisplayTurn> {
    let mut turns = Vec::new();
    let mut chunk_run: Vec<&StoredMessage> = Vec::new();

    for message in messages {
        if message.role == MessageRole::AssistantChunk {
            chunk_run.push(message);
            continue;
        }

        flush_chunk_run(&mut turns, &mut chunk_run);

        match message.role {
            // Not shown to end users.
            MessageRole::System | MessageRole::Tool => {}
            MessageRole::Human | MessageRole::Assistant => turns.push(pass_through(message)),
            MessageRole::AssistantChunk => unreachable!("chunks handled above"),
        }
    }

    // A run at the very end of the input still becomes a turn.
    flush_chunk_run(&mut turns, &mut chunk_run);
    turns
}

/// Merge accumulated chunks into one synthetic assistant turn.
fn flush_chunk_run(turns: &mut Vec<DisplayTurn>, chunk_run: &mut Vec<&StoredMessage>) {
    if chunk_run.is_empty() {
        return;
    }

    let content: String = chunk_run.iter().map(|c| c.text_content()).collect();
    let last = chunk_run
        .last()
        .expect("chunk run checked non-empty above");

    turns.push(DisplayTurn {
        id: Uuid::new_v4().to_string(),
        role: "assistant".to_string(),
        content,
        timestamp: last.timestamp,
        metadata: json!({ "chunk_count": chunk_run.len() }),
    });
    chunk_run.clear();
}

/// Pass a non-chunk message through, normalizing its role and making sure
/// it carries an id.
fn pass_through(message: &StoredMessage) -> DisplayTurn {
    DisplayTurn {
        id: message
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        role: message.role.normalized().to_string(),
        content: message.text_content(),
        timestamp: message.timestamp,
        metadata: message.metadata.clone().unwrap_or(Value::Null),
    }
}
