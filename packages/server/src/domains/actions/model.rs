//! Action model: one unit of agent work tied to a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{ActionId, UserId};

/// What started the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTrigger {
    /// The user started a conversation.
    User,
    /// An inbound data event (e.g. a new email) kicked off background work.
    DataSource,
}

/// One unit of agent work.
///
/// Created when a conversation starts or a data event arrives; flipped to
/// inactive when processing completes. Never hard-deleted here — deletion
/// is an external CRUD concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub user_id: UserId,
    pub trigger: ActionTrigger,
    pub title: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Action {
    pub fn new(user_id: UserId, trigger: ActionTrigger, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ActionId::new(),
            user_id,
            trigger,
            title: title.into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// API-facing representation of an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub id: String,
    pub user_id: String,
    pub trigger: ActionTrigger,
    pub title: String,
    pub active: bool,
    /// When the action was created (ISO 8601)
    pub created_at: String,
    /// When the action was last updated (ISO 8601)
    pub updated_at: String,
}

impl From<Action> for ActionData {
    fn from(a: Action) -> Self {
        Self {
            id: a.id.to_string(),
            user_id: a.user_id.to_string(),
            trigger: a.trigger,
            title: a.title,
            active: a.active,
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.to_rfc3339(),
        }
    }
}
