//! In-process action store.
//!
//! The persistence layer behind actions is an external concern; this store
//! keeps the working set the streaming endpoints need, scoped lookups
//! included (ownership checks back the API's not-found path).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::common::{ActionId, UserId};
use crate::domains::actions::model::{Action, ActionTrigger};

#[derive(Clone, Default)]
pub struct ActionStore {
    inner: Arc<RwLock<HashMap<ActionId, Action>>>,
}

impl ActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(
        &self,
        user_id: UserId,
        trigger: ActionTrigger,
        title: impl Into<String>,
    ) -> Action {
        let action = Action::new(user_id, trigger, title);
        let mut inner = self.inner.write().await;
        inner.insert(action.id, action.clone());
        action
    }

    /// Find an action owned by `user_id`. Returns `None` both when the
    /// action does not exist and when it belongs to someone else.
    pub async fn find_for_user(&self, user_id: UserId, action_id: ActionId) -> Option<Action> {
        let inner = self.inner.read().await;
        inner
            .get(&action_id)
            .filter(|a| a.user_id == user_id)
            .cloned()
    }

    /// Flip an action to inactive once its run completes.
    pub async fn mark_inactive(&self, action_id: ActionId) {
        let mut inner = self.inner.write().await;
        if let Some(action) = inner.get_mut(&action_id) {
            action.active = false;
            action.updated_at = Utc::now();
        }
    }

    /// Update the human-readable title (agents retitle actions mid-run).
    pub async fn set_title(&self, action_id: ActionId, title: impl Into<String>) {
        let mut inner = self.inner.write().await;
        if let Some(action) = inner.get_mut(&action_id) {
            action.title = title.into();
            action.updated_at = Utc::now();
        }
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }
}
