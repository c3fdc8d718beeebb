// Assistant seam - infrastructure trait only.
//
// The agent graph (prompting, tools, model calls) is an external
// collaborator; this crate only consumes the sequence of events it emits.
// Business logic around the stream (logging it, bridging it) lives in the
// kernel and domains.

use anyhow::Result;
use async_stream::stream;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::kernel::events::{ActionEvent, MessagePayload};

/// Event sequence produced by one assistant completion. Always ends with
/// `ActionEvent::Done`.
pub type CompletionStream = BoxStream<'static, ActionEvent>;

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Stream a completion for one prompt as wire events.
    async fn stream_completion(&self, prompt: &str) -> Result<CompletionStream>;
}

/// Deterministic assistant used for local runs and tests: acknowledges the
/// prompt, then echoes it back word by word.
pub struct ScriptedAssistant;

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn stream_completion(&self, prompt: &str) -> Result<CompletionStream> {
        let words: Vec<String> = prompt.split_whitespace().map(str::to_string).collect();

        let events = stream! {
            yield ActionEvent::Message(MessagePayload::status("Thinking..."));
            for (index, word) in words.into_iter().enumerate() {
                if index == 0 {
                    yield ActionEvent::Chunk(word);
                } else {
                    yield ActionEvent::Chunk(format!(" {}", word));
                }
            }
            yield ActionEvent::Done;
        };

        Ok(Box::pin(events))
    }
}
