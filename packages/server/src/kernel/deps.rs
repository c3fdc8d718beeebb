// Shared dependencies handed to request handlers and background runs.
//
// Constructed once at startup and passed by Arc; lifecycle is tied to
// process start/shutdown, not to any one request.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::domains::actions::ActionStore;
use crate::domains::chat::MessageStore;
use crate::kernel::assistant::{Assistant, ScriptedAssistant};
use crate::kernel::stream_log::StreamLog;

#[derive(Clone)]
pub struct ServerDeps {
    pub stream_log: StreamLog,
    pub actions: ActionStore,
    pub messages: MessageStore,
    pub assistant: Arc<dyn Assistant>,
    /// Poll timeout for blocking log reads (bounds cancellation latency).
    pub stream_poll_timeout: Duration,
    /// Interval between SSE keep-alive comments.
    pub sse_keep_alive: Duration,
}

impl ServerDeps {
    pub fn new(config: &Config, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            stream_log: StreamLog::with_capacity(config.stream_max_records),
            actions: ActionStore::new(),
            messages: MessageStore::new(),
            assistant,
            stream_poll_timeout: config.stream_poll_timeout,
            sse_keep_alive: config.sse_keep_alive,
        }
    }

    /// Deps wired with the scripted assistant and test-friendly timing.
    pub fn for_tests() -> Self {
        Self {
            stream_log: StreamLog::new(),
            actions: ActionStore::new(),
            messages: MessageStore::new(),
            assistant: Arc::new(ScriptedAssistant),
            stream_poll_timeout: Duration::from_millis(200),
            sse_keep_alive: Duration::from_secs(3),
        }
    }
}
