//! Identity types owned by the session store.
//!
//! The conversation engine only ever reads these; it never creates or
//! mutates a [`Session`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form profile data (`first_name`, `last_name`, ...).
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a user with only an id and email.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
            user_metadata: Map::new(),
            email_confirmed_at: None,
            last_sign_in_at: None,
        }
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn first_name(&self) -> Option<&str> {
        self.metadata_str("first_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        self.metadata_str("last_name")
    }

    /// "First Last", or whichever half is present.
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name(), self.last_name()]
            .into_iter()
            .flatten()
            .collect();
        parts.join(" ")
    }

    /// Short name for headers: first name, else the email's local part.
    pub fn display_name(&self) -> String {
        if let Some(first) = self.first_name() {
            return first.to_string();
        }
        match self.email.as_deref().and_then(|e| e.split('@').next()) {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => "User".to_string(),
        }
    }

    /// Single-letter avatar.
    pub fn initial(&self) -> String {
        if let Some(c) = self.first_name().and_then(|f| f.chars().next()) {
            return c.to_string();
        }
        self.email
            .as_deref()
            .and_then(|e| e.chars().next())
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default()
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// A signed-in session: the bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Token suitable for an `Authorization: Bearer` header, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        Some(self.access_token.as_str()).filter(|t| !t.is_empty())
    }
}

/// Auth-state change kinds emitted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthEvent::InitialSession => "INITIAL_SESSION",
            AuthEvent::SignedIn => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::TokenRefreshed => "TOKEN_REFRESHED",
            AuthEvent::UserUpdated => "USER_UPDATED",
            AuthEvent::PasswordRecovery => "PASSWORD_RECOVERY",
        };
        write!(f, "{}", s)
    }
}

/// One item of the provider's auth-state stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthStateChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

/// What went wrong in an identity operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Missing or malformed input (e.g. empty email).
    InvalidInput,
    /// The provider rejected the request.
    Rejected,
    /// The provider could not be reached.
    Network,
    /// The operation needs a signed-in session.
    NotAuthenticated,
    /// The provider answered with something unexpected.
    Unexpected,
}

/// Structured identity error. The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Result of an identity operation.
pub type AuthResult<T> = Result<T, AuthError>;
