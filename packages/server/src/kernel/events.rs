//! Wire events for action streams.
//!
//! Producers push typed [`ActionEvent`]s; the log stores them as raw
//! (kind, payload) pairs. Decoding back into the typed form happens at the
//! read boundary, where malformed records are skipped rather than surfaced.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload carried by `message` events.
///
/// Producers set whichever flags apply; unknown extra fields from older or
/// newer producers are tolerated on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Human-readable status line ("Reading your email...", etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// A chat-message fragment riding inside a message event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<String>,

    /// Marks this as a status notice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,

    /// Marks this as a title update for the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<bool>,

    /// Marks completion inside a message payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl MessagePayload {
    /// A status notice with the given text.
    pub fn status(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            status: Some(true),
            ..Self::default()
        }
    }

    /// A title update with the given text.
    pub fn title(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            title: Some(true),
            ..Self::default()
        }
    }
}

/// One unit of agent output on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEvent {
    /// Structured notice (status line, title update, message fragment).
    Message(MessagePayload),
    /// One plain-text fragment of the assistant's reply.
    Chunk(String),
    /// Terminal marker for the action run.
    Done,
}

/// Failure to decode a raw log record into an [`ActionEvent`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown event kind: {0}")]
    UnknownKind(String),

    #[error("malformed message payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl ActionEvent {
    /// Event kind as stored in the log and used as the SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionEvent::Message(_) => "message",
            ActionEvent::Chunk(_) => "chunk",
            ActionEvent::Done => "done",
        }
    }

    /// Serialize the payload for storage / the SSE data field.
    ///
    /// `chunk` payloads are raw text; `message` payloads are JSON strings;
    /// `done` carries no payload.
    pub fn encode_payload(&self) -> Result<String, serde_json::Error> {
        match self {
            ActionEvent::Message(payload) => serde_json::to_string(payload),
            ActionEvent::Chunk(text) => Ok(text.clone()),
            ActionEvent::Done => Ok(String::new()),
        }
    }

    /// Decode a raw (kind, payload) record back into a typed event.
    pub fn decode(kind: &str, payload: &str) -> Result<Self, DecodeError> {
        match kind {
            "chunk" => Ok(ActionEvent::Chunk(payload.to_string())),
            "message" => Ok(ActionEvent::Message(serde_json::from_str(payload)?)),
            "done" => Ok(ActionEvent::Done),
            other => Err(DecodeError::UnknownKind(other.to_string())),
        }
    }
}
