//! In-process conversation history store.
//!
//! Stand-in for the agent-state store boundary: the durable source of truth
//! a client replays after reconnect, as opposed to the stream log's
//! best-effort live tail.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::common::ActionId;
use crate::domains::chat::model::StoredMessage;

#[derive(Clone, Default)]
pub struct MessageStore {
    inner: Arc<RwLock<HashMap<ActionId, Vec<StoredMessage>>>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, action_id: ActionId, message: StoredMessage) {
        let mut inner = self.inner.write().await;
        inner.entry(action_id).or_default().push(message);
    }

    /// Full ordered history for one action (empty if none).
    pub async fn history(&self, action_id: ActionId) -> Vec<StoredMessage> {
        let inner = self.inner.read().await;
        inner.get(&action_id).cloned().unwrap_or_default()
    }

    pub async fn message_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.values().map(Vec::len).sum()
    }
}
