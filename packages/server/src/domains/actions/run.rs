//! Run action - drives one assistant completion through the stream pipeline.

use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::{error, info};

use crate::common::{ActionId, UserId};
use crate::domains::chat::StoredMessage;
use crate::kernel::events::{ActionEvent, MessagePayload};
use crate::kernel::{ServerDeps, StreamWriter};

/// Drive the assistant for one action, logging every unit of output to the
/// action's stream and recording the turns in the conversation history.
///
/// This function:
/// 1. Records the user's prompt in the message store
/// 2. Pushes an opening status notice
/// 3. Forwards assistant output event by event (chunks also land in history)
/// 4. Pushes exactly one `done`, runs writer cleanup, marks the action inactive
///
/// Push failures propagate and abort the run — a stream nobody can append
/// to is not worth continuing.
pub async fn run_action(
    deps: &ServerDeps,
    user_id: UserId,
    action_id: ActionId,
    prompt: String,
) -> Result<()> {
    info!(user_id = %user_id, action_id = %action_id, "Starting action run");

    deps.messages
        .append(action_id, StoredMessage::human(prompt.clone()))
        .await;

    let writer = StreamWriter::new(deps.stream_log.clone(), user_id, action_id);
    writer
        .push(&ActionEvent::Message(MessagePayload::status(
            "Working on it...",
        )))
        .await?;

    let mut events = match deps.assistant.stream_completion(&prompt).await {
        Ok(events) => events,
        Err(e) => {
            error!(action_id = %action_id, error = %e, "Assistant failed to start");
            // Close out the stream so attached clients don't hang on a run
            // that will never produce output.
            writer.push(&ActionEvent::Done).await?;
            writer.cleanup().await?;
            deps.actions.mark_inactive(action_id).await;
            return Err(e).context("Assistant failed to start completion");
        }
    };

    let mut chunk_count = 0usize;
    while let Some(event) = events.next().await {
        match &event {
            ActionEvent::Chunk(text) => {
                chunk_count += 1;
                deps.messages
                    .append(action_id, StoredMessage::assistant_chunk(text.clone()))
                    .await;
                writer.push(&event).await?;
            }
            ActionEvent::Message(payload) => {
                if payload.title == Some(true) {
                    if let Some(text) = &payload.text {
                        deps.actions.set_title(action_id, text.clone()).await;
                    }
                }
                writer.push(&event).await?;
            }
            // The producer owns the terminal marker: push it once below,
            // never forward a second one from the assistant.
            ActionEvent::Done => break,
        }
    }

    writer.push(&ActionEvent::Done).await?;
    writer.cleanup().await?;
    deps.actions.mark_inactive(action_id).await;

    info!(
        action_id = %action_id,
        chunk_count,
        "Action run complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::actions::model::ActionTrigger;
    use crate::domains::chat::{consolidate, MessageRole};
    use crate::kernel::stream_reader::subscribe;
    use crate::kernel::{Assistant, CompletionStream};
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    struct UnavailableAssistant;

    #[async_trait]
    impl Assistant for UnavailableAssistant {
        async fn stream_completion(&self, _prompt: &str) -> anyhow::Result<CompletionStream> {
            anyhow::bail!("completion backend unavailable")
        }
    }

    #[tokio::test]
    async fn test_run_streams_chunks_then_done_and_deactivates() {
        let deps = ServerDeps::for_tests();
        let action = deps
            .actions
            .create(UserId::new(), ActionTrigger::User, "echo")
            .await;

        let abort = CancellationToken::new();
        let events = subscribe(
            &deps.stream_log,
            action.user_id,
            action.id,
            abort.clone(),
            Duration::from_secs(5),
        )
        .await;

        run_action(&deps, action.user_id, action.id, "hello world".to_string())
            .await
            .unwrap();

        tokio::pin!(events);
        let mut seen = Vec::new();
        loop {
            let event = events.next().await.unwrap();
            let done = event == ActionEvent::Done;
            seen.push(event);
            if done {
                break;
            }
        }

        assert!(matches!(seen[0], ActionEvent::Message(_)));
        let reply: String = seen
            .iter()
            .filter_map(|e| match e {
                ActionEvent::Chunk(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(reply, "hello world");
        assert_eq!(seen.last(), Some(&ActionEvent::Done));

        let reloaded = deps
            .actions
            .find_for_user(action.user_id, action.id)
            .await
            .unwrap();
        assert!(!reloaded.active);
        abort.cancel();
    }

    #[tokio::test]
    async fn test_failed_assistant_start_still_closes_out_the_run() {
        let deps = ServerDeps {
            assistant: Arc::new(UnavailableAssistant),
            ..ServerDeps::for_tests()
        };
        let action = deps
            .actions
            .create(UserId::new(), ActionTrigger::User, "doomed")
            .await;

        let abort = CancellationToken::new();
        let events = subscribe(
            &deps.stream_log,
            action.user_id,
            action.id,
            abort.clone(),
            Duration::from_secs(5),
        )
        .await;

        let result = run_action(&deps, action.user_id, action.id, "hi".to_string()).await;
        assert!(result.is_err());

        // Attached clients get the same terminal sequence as a successful
        // run: opening status, then done.
        tokio::pin!(events);
        assert!(matches!(
            events.next().await,
            Some(ActionEvent::Message(_))
        ));
        assert_eq!(events.next().await, Some(ActionEvent::Done));

        let reloaded = deps
            .actions
            .find_for_user(action.user_id, action.id)
            .await
            .unwrap();
        assert!(!reloaded.active);
        abort.cancel();
    }

    #[tokio::test]
    async fn test_run_records_consolidatable_history() {
        let deps = ServerDeps::for_tests();
        let action = deps
            .actions
            .create(UserId::new(), ActionTrigger::User, "echo")
            .await;

        run_action(&deps, action.user_id, action.id, "hello world".to_string())
            .await
            .unwrap();

        let history = deps.messages.history(action.id).await;
        assert_eq!(history[0].role, MessageRole::Human);
        assert!(history[1..]
            .iter()
            .all(|m| m.role == MessageRole::AssistantChunk));

        let turns = consolidate(&history);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "hello world");
        assert_eq!(turns[1].role, "assistant");
        assert_eq!(turns[1].content, "hello world");
    }
}
