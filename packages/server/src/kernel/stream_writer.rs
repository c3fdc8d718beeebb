//! Producer-side API for one action stream.

use anyhow::{Context, Result};

use crate::common::{ActionId, UserId};
use crate::kernel::events::ActionEvent;
use crate::kernel::stream_log::StreamLog;

/// Writer bound to one (user, action) stream.
///
/// Safe to share between concurrent producers for the same action — the
/// log's append is the serialization point.
#[derive(Clone)]
pub struct StreamWriter {
    log: StreamLog,
    key: String,
}

impl StreamWriter {
    pub fn new(log: StreamLog, user_id: UserId, action_id: ActionId) -> Self {
        let key = StreamLog::stream_key(&user_id, &action_id);
        Self { log, key }
    }

    /// Append one event, returning its log position.
    ///
    /// Failures propagate to the producer, which decides whether to abort
    /// the action run.
    pub async fn push(&self, event: &ActionEvent) -> Result<u64> {
        let payload = event
            .encode_payload()
            .context("Failed to serialize event payload")?;
        let position = self
            .log
            .append(&self.key, event.kind(), payload)
            .await
            .with_context(|| format!("Failed to append to stream {}", self.key))?;

        tracing::trace!(key = %self.key, position, kind = event.kind(), "Event appended");
        Ok(position)
    }

    /// Retention hook, called once per action run after the final `done`.
    ///
    /// Currently inert: the log keeps the full stream so late subscribers can
    /// replay. TODO: trim streams for inactive actions once a retention
    /// policy is settled.
    pub async fn cleanup(&self) -> Result<()> {
        tracing::debug!(key = %self.key, "Stream writer cleanup");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::events::MessagePayload;
    use crate::kernel::stream_log::LogCursor;
    use std::time::Duration;

    #[tokio::test]
    async fn test_push_appends_encoded_records() {
        let log = StreamLog::new();
        let user_id = UserId::new();
        let action_id = ActionId::new();
        let writer = StreamWriter::new(log.clone(), user_id, action_id);

        writer
            .push(&ActionEvent::Message(MessagePayload::status("Working")))
            .await
            .unwrap();
        writer
            .push(&ActionEvent::Chunk("Hello".to_string()))
            .await
            .unwrap();
        writer.push(&ActionEvent::Done).await.unwrap();
        writer.cleanup().await.unwrap();

        let key = StreamLog::stream_key(&user_id, &action_id);
        let conn = log.reader_conn();
        let batch = conn
            .read_after(&key, LogCursor::Start, Duration::from_millis(50))
            .await
            .unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].kind, "message");
        assert_eq!(batch[1].kind, "chunk");
        assert_eq!(batch[1].payload, "Hello");
        assert_eq!(batch[2].kind, "done");
    }

    #[tokio::test]
    async fn test_push_propagates_append_failure() {
        let log = StreamLog::with_capacity(1);
        let writer = StreamWriter::new(log, UserId::new(), ActionId::new());

        writer
            .push(&ActionEvent::Chunk("a".to_string()))
            .await
            .unwrap();
        let err = writer.push(&ActionEvent::Chunk("b".to_string())).await;
        assert!(err.is_err());
    }
}
