//! SSE bridge for action event streams.
//!
//! Adapts a lazy [`ActionEvent`] sequence to an axum `Sse` response:
//! one SSE message per event, in arrival order, unbatched, with periodic
//! keep-alive comments. The keep-alive timer lives inside the response and
//! is torn down with it on every exit path (completion, disconnect, error).

use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

use crate::kernel::events::ActionEvent;

/// Forward events until (and including) the first `done`.
///
/// Once `done` has gone out, nothing further is forwarded even if the
/// underlying reader still has buffered records — a second `done` must
/// never reach the client.
pub fn until_done<S>(events: S) -> impl Stream<Item = ActionEvent> + Send + 'static
where
    S: Stream<Item = ActionEvent> + Send + 'static,
{
    stream! {
        let mut events = Box::pin(events);
        while let Some(event) = events.next().await {
            let is_done = matches!(event, ActionEvent::Done);
            yield event;
            if is_done {
                break;
            }
        }
    }
}

/// Convert an event stream into SSE messages.
///
/// Leads with a `connected` event so clients can tell the stream from a
/// stalled connection, then forwards each event as `event: <kind>` with the
/// encoded payload as data. Events that fail to encode are logged and
/// dropped, mirroring the reader's skip-on-malformed policy.
pub fn into_sse_events<S>(events: S) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static
where
    S: Stream<Item = ActionEvent> + Send + 'static,
{
    stream! {
        yield Ok(Event::default().event("connected").data("ok"));

        let mut events = Box::pin(until_done(events));
        while let Some(event) = events.next().await {
            match event.encode_payload() {
                Ok(payload) => yield Ok(Event::default().event(event.kind()).data(payload)),
                Err(err) => {
                    tracing::warn!(kind = event.kind(), error = %err, "Dropping unencodable event");
                }
            }
        }
    }
}

/// Bridge an event stream to a live SSE response.
pub fn bridge<S>(events: S, keep_alive: Duration) -> Sse<BoxStream<'static, Result<Event, Infallible>>>
where
    S: Stream<Item = ActionEvent> + Send + 'static,
{
    Sse::new(into_sse_events(events).boxed())
        .keep_alive(KeepAlive::new().interval(keep_alive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::events::MessagePayload;
    use futures::stream;

    #[tokio::test]
    async fn test_until_done_passes_everything_without_done() {
        let input = vec![
            ActionEvent::Chunk("a".to_string()),
            ActionEvent::Chunk("b".to_string()),
        ];
        let out: Vec<_> = until_done(stream::iter(input.clone())).collect().await;
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn test_until_done_short_circuits_after_done() {
        let input = stream::iter(vec![
            ActionEvent::Chunk("a".to_string()),
            ActionEvent::Done,
            ActionEvent::Chunk("never delivered".to_string()),
            ActionEvent::Done,
        ]);

        let out: Vec<_> = until_done(input).collect().await;
        assert_eq!(
            out,
            vec![ActionEvent::Chunk("a".to_string()), ActionEvent::Done]
        );
    }

    #[tokio::test]
    async fn test_done_ends_stream_even_with_pending_events() {
        // The source never terminates on its own; only the done marker ends
        // the bridge's consumption.
        let input = stream::iter(vec![ActionEvent::Done]).chain(stream::pending());
        let out: Vec<_> = until_done(input).collect().await;
        assert_eq!(out, vec![ActionEvent::Done]);
    }

    #[tokio::test]
    async fn test_sse_events_lead_with_connected_and_end_after_done() {
        let input = stream::iter(vec![
            ActionEvent::Message(MessagePayload::status("Working")),
            ActionEvent::Chunk("hi".to_string()),
            ActionEvent::Done,
        ]);

        let out: Vec<_> = into_sse_events(input).collect().await;
        // connected + message + chunk + done
        assert_eq!(out.len(), 4);
    }
}
