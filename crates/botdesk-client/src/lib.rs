//! Client library for botdesk.
//!
//! Provides the two remote collaborators of the chat client:
//! - the dialogue service, reached through the Rasa REST webhook
//! - the identity provider, reached through the Supabase auth REST API
//!
//! Both sit behind traits so the engine can be driven by fakes in tests.

pub mod error;
pub mod identity;
pub mod webhook;

pub use error::ClientError;
pub use identity::{AuthEventBus, AuthSubscription, IdentityProvider, SupabaseAuthClient};
pub use webhook::{
    token_preview, webhook_url, DialogueRequest, DialogueService, RasaClient, RequestMetadata,
    WebhookPayload, WebhookReply,
};
