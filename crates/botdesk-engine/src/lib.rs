//! botdesk engine
//!
//! The coordination logic of the chat client, kept free of terminal and
//! HTTP details:
//! - [`ConversationEngine`] owns message history, the awaiting-reply guard
//!   and the replay of a message interrupted by an authentication request.
//! - [`IdentityStore`] wraps the identity provider as one observable value.
//! - [`AuthForm`] is the email-then-passcode sign-in form.
//!
//! The engine never performs I/O itself. Operations that need the network
//! return a [`DialogueRequest`](botdesk_client::DialogueRequest) for the
//! caller to send, and the outcome is fed back in.

pub mod auth_form;
pub mod conversation;
pub mod identity;

pub use auth_form::{AuthForm, AuthRequest, AuthStep, FormOutcome};
pub use conversation::{ConversationEngine, QuickReplyOutcome, AUTH_TRIGGER_PAYLOAD};
pub use identity::{IdentitySnapshot, IdentityStore};
