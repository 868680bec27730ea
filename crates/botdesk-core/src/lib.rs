//! botdesk Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Terminal rendering
//! - Runtime specifics
//!
//! All types here represent the conversation and identity domain of botdesk.

pub mod error;
pub mod identity;
pub mod ids;
pub mod message;
pub mod state;
pub mod unicode;

// Re-export commonly used types
pub use error::CoreError;
pub use identity::{AuthError, AuthErrorKind, AuthEvent, AuthResult, AuthStateChange, Session, User};
pub use ids::MessageId;
pub use message::{Message, Origin, QuickReply};
pub use state::{ConversationState, ErrorInfo, ErrorKind, PendingAuthResumption};
pub use unicode::decode_unicode_escapes;
