//! Newtype wrapper for message identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message in the conversation history.
///
/// Ids are handed out by the conversation engine from a monotonic counter,
/// so they are unique within a session and sort in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    /// Create a MessageId from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Get the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_next_is_ordered() {
        let first = MessageId::new(1);
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.as_u64(), 2);
    }

    #[test]
    fn test_id_display() {
        let id = MessageId::new(42);
        assert_eq!(format!("{}", id), "42");
    }
}
