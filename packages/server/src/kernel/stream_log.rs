//! Append-only event log for action streams.
//!
//! One ordered record log per (user, action) key, with blocking tail reads.
//! Reads never consume: every reader replays from its own cursor, so any
//! number of consumers can follow the same stream (multicast-by-replay).
//!
//! Blocking reads go through a dedicated [`LogReaderConn`] per consumer — a
//! connection parked in a long poll cannot serve anything else, and closing
//! it wakes the poll immediately. Appends are non-blocking and go through
//! the shared [`StreamLog`] handle directly.
//!
//! Ordering is guaranteed only within one key; nothing is guaranteed across
//! keys, and nothing is required.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Notify, RwLock};
use tokio_util::sync::CancellationToken;

use crate::common::{ActionId, UserId};

/// Where a read starts relative to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCursor {
    /// Replay every record from the beginning.
    Start,
    /// Records with position strictly greater than this one.
    After(u64),
}

/// One appended record. Kind and payload are stored raw; decoding into a
/// typed event happens at the read boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Log-assigned position, strictly increasing per key starting at 1.
    pub position: u64,
    pub kind: String,
    pub payload: String,
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("stream {key} is at capacity ({max} records)")]
    CapacityExceeded { key: String, max: usize },
}

#[derive(Debug, Error)]
pub enum LogReadError {
    #[error("reader connection closed")]
    ConnectionClosed,
}

struct StreamState {
    records: Vec<LogRecord>,
    next_position: u64,
    appended: Arc<Notify>,
}

impl StreamState {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            next_position: 1,
            appended: Arc::new(Notify::new()),
        }
    }
}

struct LogInner {
    streams: RwLock<HashMap<String, StreamState>>,
    open_readers: AtomicUsize,
    max_records: usize,
}

/// In-process stream log engine.
///
/// Thread-safe, cloneable. Keyed by string stream keys derived from
/// (user, action) pairs.
#[derive(Clone)]
pub struct StreamLog {
    inner: Arc<LogInner>,
}

impl StreamLog {
    /// Create a log with the default per-stream retention cap.
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Create a log that refuses appends past `max_records` per stream.
    pub fn with_capacity(max_records: usize) -> Self {
        Self {
            inner: Arc::new(LogInner {
                streams: RwLock::new(HashMap::new()),
                open_readers: AtomicUsize::new(0),
                max_records,
            }),
        }
    }

    /// Derive the stream key for one (user, action) pair.
    pub fn stream_key(user_id: &UserId, action_id: &ActionId) -> String {
        format!("action:{}:{}", user_id, action_id)
    }

    /// Append one record, returning its assigned position.
    ///
    /// The append is the serialization point for concurrent producers on the
    /// same key; callers need no locking of their own. Failures propagate —
    /// a producer must decide whether to abort its run.
    pub async fn append(
        &self,
        key: &str,
        kind: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<u64, LogError> {
        let appended = {
            let mut streams = self.inner.streams.write().await;
            let state = streams
                .entry(key.to_string())
                .or_insert_with(StreamState::new);

            if state.records.len() >= self.inner.max_records {
                return Err(LogError::CapacityExceeded {
                    key: key.to_string(),
                    max: self.inner.max_records,
                });
            }

            let position = state.next_position;
            state.next_position += 1;
            state.records.push(LogRecord {
                position,
                kind: kind.into(),
                payload: payload.into(),
            });
            (position, state.appended.clone())
        };

        let (position, notify) = appended;
        notify.notify_waiters();
        Ok(position)
    }

    /// Position of the last record for `key`, or 0 if the stream is empty.
    ///
    /// `LogCursor::After(tail_position(..))` is the "only future records"
    /// cursor a fresh subscriber starts from.
    pub async fn tail_position(&self, key: &str) -> u64 {
        let streams = self.inner.streams.read().await;
        streams.get(key).map_or(0, |s| s.next_position - 1)
    }

    /// Open a dedicated connection for blocking reads.
    pub fn reader_conn(&self) -> LogReaderConn {
        self.inner.open_readers.fetch_add(1, Ordering::SeqCst);
        LogReaderConn {
            log: self.clone(),
            closed: CancellationToken::new(),
            released: AtomicBool::new(false),
        }
    }

    /// Number of reader connections currently open.
    pub fn open_reader_conns(&self) -> usize {
        self.inner.open_readers.load(Ordering::SeqCst)
    }

    /// Number of streams with at least one appended or awaited record.
    pub async fn stream_count(&self) -> usize {
        self.inner.streams.read().await.len()
    }

    /// Notifier for appends on `key`, creating the stream entry if needed
    /// (subscribers may attach before the producer's first append).
    async fn notifier(&self, key: &str) -> Arc<Notify> {
        let mut streams = self.inner.streams.write().await;
        streams
            .entry(key.to_string())
            .or_insert_with(StreamState::new)
            .appended
            .clone()
    }

    /// Non-blocking snapshot of records after `cursor`.
    async fn snapshot_after(&self, key: &str, cursor: LogCursor) -> Vec<LogRecord> {
        let streams = self.inner.streams.read().await;
        let Some(state) = streams.get(key) else {
            return Vec::new();
        };
        let floor = match cursor {
            LogCursor::Start => 0,
            LogCursor::After(position) => position,
        };
        let start = state.records.partition_point(|r| r.position <= floor);
        state.records[start..].to_vec()
    }
}

impl Default for StreamLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Dedicated per-consumer connection for blocking tail reads.
///
/// Closing the connection (explicitly or by drop) wakes any in-flight
/// blocking read at once and releases the connection slot.
pub struct LogReaderConn {
    log: StreamLog,
    closed: CancellationToken,
    released: AtomicBool,
}

impl LogReaderConn {
    /// Block until records after `cursor` exist, the timeout elapses, or the
    /// connection is closed.
    ///
    /// Returns `Ok(vec![])` on timeout — the caller loops, which is what
    /// keeps cancellation latency bounded by the poll timeout.
    pub async fn read_after(
        &self,
        key: &str,
        cursor: LogCursor,
        timeout: Duration,
    ) -> Result<Vec<LogRecord>, LogReadError> {
        if self.closed.is_cancelled() {
            return Err(LogReadError::ConnectionClosed);
        }

        let notify = self.log.notifier(key).await;
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            // Register for wakeup before snapshotting, so an append landing
            // between the snapshot and the wait is not lost.
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let batch = self.log.snapshot_after(key, cursor).await;
            if !batch.is_empty() {
                return Ok(batch);
            }

            tokio::select! {
                _ = self.closed.cancelled() => return Err(LogReadError::ConnectionClosed),
                _ = tokio::time::sleep_until(deadline) => return Ok(Vec::new()),
                _ = &mut notified => {}
            }
        }
    }

    /// Close the connection, waking any in-flight read and releasing the
    /// connection slot immediately.
    pub fn close(&self) {
        self.closed.cancel();
        if !self.released.swap(true, Ordering::SeqCst) {
            self.log.inner.open_readers.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for LogReaderConn {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> String {
        StreamLog::stream_key(&UserId::new(), &ActionId::new())
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_positions() {
        let log = StreamLog::new();
        let key = key();

        let p1 = log.append(&key, "chunk", "a").await.unwrap();
        let p2 = log.append(&key, "chunk", "b").await.unwrap();

        assert_eq!(p1, 1);
        assert_eq!(p2, 2);
        assert_eq!(log.tail_position(&key).await, 2);
    }

    #[tokio::test]
    async fn test_read_from_start_replays_everything() {
        let log = StreamLog::new();
        let key = key();
        log.append(&key, "chunk", "a").await.unwrap();
        log.append(&key, "done", "").await.unwrap();

        let conn = log.reader_conn();
        let batch = conn
            .read_after(&key, LogCursor::Start, Duration::from_millis(50))
            .await
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].payload, "a");
        assert_eq!(batch[1].kind, "done");
    }

    #[tokio::test]
    async fn test_read_after_cursor_skips_delivered_records() {
        let log = StreamLog::new();
        let key = key();
        log.append(&key, "chunk", "a").await.unwrap();
        log.append(&key, "chunk", "b").await.unwrap();

        let conn = log.reader_conn();
        let batch = conn
            .read_after(&key, LogCursor::After(1), Duration::from_millis(50))
            .await
            .unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].payload, "b");
    }

    #[tokio::test]
    async fn test_timeout_returns_empty_batch() {
        let log = StreamLog::new();
        let conn = log.reader_conn();

        let batch = conn
            .read_after(&key(), LogCursor::Start, Duration::from_millis(20))
            .await
            .unwrap();

        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_blocked_read_wakes_on_append() {
        let log = StreamLog::new();
        let key = key();
        let conn = log.reader_conn();

        let reader = {
            let log = log.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let conn = log.reader_conn();
                conn.read_after(&key, LogCursor::Start, Duration::from_secs(5))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        log.append(&key, "chunk", "late").await.unwrap();

        let batch = reader.await.unwrap().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].payload, "late");
        drop(conn);
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_read_immediately() {
        let log = StreamLog::new();
        let conn = Arc::new(log.reader_conn());
        assert_eq!(log.open_reader_conns(), 1);

        let blocked = {
            let conn = conn.clone();
            let key = key();
            tokio::spawn(async move {
                conn.read_after(&key, LogCursor::Start, Duration::from_secs(30))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        conn.close();
        assert_eq!(log.open_reader_conns(), 0);

        let result = tokio::time::timeout(Duration::from_millis(200), blocked)
            .await
            .expect("read did not wake on close")
            .unwrap();
        assert!(matches!(result, Err(LogReadError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_drop_releases_connection_slot() {
        let log = StreamLog::new();
        let conn = log.reader_conn();
        assert_eq!(log.open_reader_conns(), 1);
        drop(conn);
        assert_eq!(log.open_reader_conns(), 0);
    }

    #[tokio::test]
    async fn test_capacity_exceeded_propagates() {
        let log = StreamLog::with_capacity(2);
        let key = key();
        log.append(&key, "chunk", "a").await.unwrap();
        log.append(&key, "chunk", "b").await.unwrap();

        let err = log.append(&key, "chunk", "c").await.unwrap_err();
        assert!(matches!(err, LogError::CapacityExceeded { max: 2, .. }));
    }

    #[tokio::test]
    async fn test_streams_are_independent() {
        let log = StreamLog::new();
        let key_a = key();
        let key_b = key();
        log.append(&key_a, "chunk", "a").await.unwrap();

        assert_eq!(log.tail_position(&key_a).await, 1);
        assert_eq!(log.tail_position(&key_b).await, 0);
    }
}
