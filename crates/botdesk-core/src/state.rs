//! Conversation state shared between the engine and its views.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Category of a surfaced error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No response was received.
    Transport,
    /// The service answered with a non-2xx status.
    Status,
    /// The response body could not be interpreted.
    Decode,
}

/// An error shown inline next to the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Status, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Everything the chat surface needs to render the conversation.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    /// Append-only history; index order is display order.
    pub messages: Vec<Message>,

    /// True while a dialogue request is outstanding (the "typing" indicator).
    pub is_awaiting_reply: bool,

    /// Error from the last dialogue exchange.
    pub last_error: Option<ErrorInfo>,

    /// Result of the last connectivity probe.
    pub is_connected: bool,

    /// Error from the last connectivity probe, kept apart from `last_error`.
    pub connection_error: Option<ErrorInfo>,
}

/// Record that the dialogue service asked for authentication and which
/// message to replay once a user is signed in.
///
/// Only one exists at a time. A second trigger before resumption overwrites
/// the first (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingAuthResumption {
    pub was_triggered_by_bot: bool,
    pub original_message_text: Option<String>,
}

impl PendingAuthResumption {
    /// Fresh record for a just-sent user message.
    pub fn candidate(text: impl Into<String>) -> Self {
        Self {
            was_triggered_by_bot: false,
            original_message_text: Some(text.into()),
        }
    }

    /// Whether a sign-in should replay the original message.
    pub fn is_ready(&self) -> bool {
        self.was_triggered_by_bot && self.original_message_text.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
