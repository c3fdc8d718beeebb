//! Consumer-side reader for one action stream.
//!
//! Produces a lazy, cancellable sequence of decoded events starting at
//! "only new" — records appended before subscription are never delivered.
//! History replay belongs to the chat consolidator, not the log.

use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::common::{ActionId, UserId};
use crate::kernel::events::ActionEvent;
use crate::kernel::stream_log::{LogCursor, StreamLog};

/// Subscribe to one (user, action) stream.
///
/// The subscription point is established here, eagerly: the cursor snapshots
/// the current tail and the dedicated reader connection is opened before the
/// stream is first polled.
///
/// The returned stream:
/// - blocks in poll-timeout-sized slices, so firing `abort` ends it within
///   one scheduling opportunity and releases the connection at once;
/// - skips malformed records (logged, never surfaced);
/// - does NOT stop on `done` — the log has no notion of a finished stream,
///   only the application-level marker does, and acting on it is the SSE
///   bridge's job;
/// - ends without error on abort, and ends on any non-timeout read error
///   (the client reconnects to retry).
pub async fn subscribe(
    log: &StreamLog,
    user_id: UserId,
    action_id: ActionId,
    abort: CancellationToken,
    poll_timeout: Duration,
) -> impl Stream<Item = ActionEvent> + Send + 'static {
    let key = StreamLog::stream_key(&user_id, &action_id);
    let mut cursor = LogCursor::After(log.tail_position(&key).await);
    let conn = log.reader_conn();

    stream! {
        loop {
            if abort.is_cancelled() {
                conn.close();
                break;
            }

            let batch = tokio::select! {
                _ = abort.cancelled() => {
                    conn.close();
                    tracing::debug!(key = %key, "Stream reader aborted");
                    break;
                }
                result = conn.read_after(&key, cursor, poll_timeout) => result,
            };

            match batch {
                // Timeout comes back as an empty batch; loop to observe abort.
                Ok(records) => {
                    for record in records {
                        cursor = LogCursor::After(record.position);
                        match ActionEvent::decode(&record.kind, &record.payload) {
                            Ok(event) => yield event,
                            Err(err) => {
                                tracing::warn!(
                                    key = %key,
                                    position = record.position,
                                    error = %err,
                                    "Skipping malformed stream record"
                                );
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::error!(key = %key, error = %err, "Stream read failed, ending reader");
                    conn.close();
                    break;
                }
            }
        }
    }
}
