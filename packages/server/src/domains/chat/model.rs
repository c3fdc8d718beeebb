//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Role discriminant for persisted conversation entries.
///
/// Assistant output may arrive split into `AssistantChunk` entries; chunks
/// belonging to one logical turn are contiguous in the persisted sequence.
/// The consolidator relies on that invariant, it does not re-derive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    Human,
    AssistantChunk,
    Assistant,
    Tool,
}

impl MessageRole {
    /// Display-facing role name: one of user / assistant / system / tool.
    pub fn normalized(&self) -> &'static str {
        match self {
            MessageRole::Human => "user",
            MessageRole::AssistantChunk | MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
            MessageRole::Tool => "tool",
        }
    }
}

/// One persisted conversation entry, as held by the agent-state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: MessageRole,
    /// String content or a serializable structure (tool-call descriptors).
    pub content: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl StoredMessage {
    fn new(role: MessageRole, content: Value) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            role,
            content,
            timestamp: Some(Utc::now()),
            metadata: None,
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Human, Value::String(content.into()))
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, Value::String(content.into()))
    }

    pub fn assistant_chunk(content: impl Into<String>) -> Self {
        Self::new(MessageRole::AssistantChunk, Value::String(content.into()))
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, Value::String(content.into()))
    }

    pub fn tool(descriptor: Value) -> Self {
        Self::new(MessageRole::Tool, descriptor)
    }

    /// Extract the text content: strings as-is, structures with a `text`
    /// field by that field, anything else by its JSON rendering.
    pub fn text_content(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Object(map) => match map.get("text") {
                Some(Value::String(s)) => s.clone(),
                _ => self.content.to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// One display-ready conversation turn, as served by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTurn {
    pub id: String,
    /// Normalized role: user / assistant / system / tool.
    pub role: String,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_content_of_string() {
        assert_eq!(StoredMessage::human("hi").text_content(), "hi");
    }

    #[test]
    fn test_text_content_of_structure_with_text_field() {
        let msg = StoredMessage::tool(json!({"text": "ran search", "tool": "search"}));
        assert_eq!(msg.text_content(), "ran search");
    }

    #[test]
    fn test_role_normalization() {
        assert_eq!(MessageRole::Human.normalized(), "user");
        assert_eq!(MessageRole::AssistantChunk.normalized(), "assistant");
        assert_eq!(MessageRole::Assistant.normalized(), "assistant");
        assert_eq!(MessageRole::System.normalized(), "system");
        assert_eq!(MessageRole::Tool.normalized(), "tool");
    }
}
