//! Conversation messages and quick-reply actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MessageId;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Typed or clicked by the person at the keyboard.
    User,
    /// Produced by the dialogue service.
    Bot,
}

/// A labeled response option offered alongside a bot message.
///
/// The payload is opaque routing data for the dialogue service and is never
/// shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReply {
    /// Text shown on the button.
    #[serde(rename = "title")]
    pub label: String,
    /// Payload sent back to the dialogue service when selected.
    pub payload: String,
}

impl QuickReply {
    /// Create a new quick reply.
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// A message in the conversation history.
///
/// Messages are immutable once appended; fields are only readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    origin: Origin,
    text: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    quick_replies: Vec<QuickReply>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(id: MessageId, origin: Origin, text: impl Into<String>) -> Self {
        Self {
            id,
            origin,
            text: text.into(),
            timestamp: Utc::now(),
            quick_replies: Vec::new(),
        }
    }

    /// Create a user message.
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, Origin::User, text)
    }

    /// Create a bot message carrying quick replies.
    pub fn bot(id: MessageId, text: impl Into<String>, quick_replies: Vec<QuickReply>) -> Self {
        Self {
            quick_replies,
            ..Self::new(id, Origin::Bot, text)
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn quick_replies(&self) -> &[QuickReply] {
        &self.quick_replies
    }

    /// ISO-8601 rendering of the timestamp.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339()
    }

    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }
}
