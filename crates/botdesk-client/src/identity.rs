//! Identity provider client (Supabase auth REST API).
//!
//! Passwordless sign-in: `request OTP -> verify OTP -> session`. The session
//! lives in memory only and is announced on an auth-state stream, the same
//! way the provider's browser SDK announces `SIGNED_IN` / `SIGNED_OUT`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use botdesk_core::{AuthError, AuthErrorKind, AuthEvent, AuthResult, AuthStateChange, Session, User};

/// Capacity of the auth-state broadcast channel.
const AUTH_EVENT_CAPACITY: usize = 16;

/// Subscription to auth-state changes.
///
/// Dropping it stops delivery.
pub struct AuthSubscription {
    rx: broadcast::Receiver<AuthStateChange>,
}

impl AuthSubscription {
    /// Wait for the next change. Returns `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<AuthStateChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Auth event subscription lagged by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Fan-out of auth-state changes to any number of subscribers.
#[derive(Clone)]
pub struct AuthEventBus {
    tx: broadcast::Sender<AuthStateChange>,
}

impl AuthEventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        debug!(event = %event, receivers = self.tx.receiver_count(), "Auth state change");
        let _ = self.tx.send(AuthStateChange { event, session });
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity provider operations used by the session store.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The current session, if someone is signed in.
    async fn get_current_session(&self) -> AuthResult<Option<Session>>;

    /// Subscribe to auth-state changes.
    fn on_auth_state_change(&self) -> AuthSubscription;

    /// Email a one-time passcode to `email`.
    async fn sign_in_with_otp(&self, email: &str) -> AuthResult<()>;

    /// Exchange an emailed passcode for a session.
    async fn verify_otp(&self, email: &str, code: &str) -> AuthResult<Session>;

    /// End the current session.
    async fn sign_out(&self) -> AuthResult<()>;

    /// Merge `updates` into the signed-in user's metadata.
    async fn update_profile(&self, updates: Value) -> AuthResult<User>;

    /// Email a password-reset link.
    async fn reset_password(&self, email: &str) -> AuthResult<()>;
}

/// Error body shapes returned by the auth API.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

/// HTTP client for the Supabase auth REST API.
pub struct SupabaseAuthClient {
    inner: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    events: AuthEventBus,
}

impl SupabaseAuthClient {
    /// Create a client for the project at `base_url` using its anon key.
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
            events: AuthEventBus::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let url = self.url(path);
        debug!(url = %url, method = %method, "Auth request");
        self.inner
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(self.anon_key.as_str()))
    }

    /// Send a request and turn provider errors into [`AuthError`]s.
    async fn send(&self, builder: reqwest::RequestBuilder) -> AuthResult<reqwest::Response> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Identity provider unreachable");
            AuthError::new(
                AuthErrorKind::Network,
                format!("Could not reach the identity provider: {}", e),
            )
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ProviderErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .into_message()
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        debug!(status = status.as_u16(), message = %message, "Identity provider rejected request");
        Err(AuthError::new(AuthErrorKind::Rejected, message))
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> AuthResult<T> {
        response
            .json()
            .await
            .map_err(|e| AuthError::new(AuthErrorKind::Unexpected, e.to_string()))
    }

    async fn access_token(&self) -> AuthResult<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or_else(|| AuthError::new(AuthErrorKind::NotAuthenticated, "Not signed in"))
    }
}

fn require_email(email: &str) -> AuthResult<&str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::new(AuthErrorKind::InvalidInput, "Email is required"));
    }
    Ok(email)
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn get_current_session(&self) -> AuthResult<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.events.subscribe()
    }

    async fn sign_in_with_otp(&self, email: &str) -> AuthResult<()> {
        let email = require_email(email)?;
        let builder = self
            .request(reqwest::Method::POST, "/otp", None)
            .json(&json!({ "email": email, "create_user": true }));
        self.send(builder).await?;
        info!("One-time passcode requested");
        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> AuthResult<Session> {
        let email = require_email(email)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::new(AuthErrorKind::InvalidInput, "Code is required"));
        }

        let builder = self
            .request(reqwest::Method::POST, "/verify", None)
            .json(&json!({ "type": "email", "email": email, "token": code }));
        let session: Session = Self::parse(self.send(builder).await?).await?;

        info!(user_id = %session.user.id, "Signed in");
        *self.session.write().await = Some(session.clone());
        self.events.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };

        // Local state goes first so a failed remote call cannot leave a
        // half-signed-in client behind.
        self.events.emit(AuthEvent::SignedOut, None);
        info!(user_id = %session.user.id, "Signed out");

        let builder = self.request(reqwest::Method::POST, "/logout", Some(&session.access_token));
        self.send(builder).await?;
        Ok(())
    }

    async fn update_profile(&self, updates: Value) -> AuthResult<User> {
        let token = self.access_token().await?;
        let builder = self
            .request(reqwest::Method::PUT, "/user", Some(&token))
            .json(&json!({ "data": updates }));
        let user: User = Self::parse(self.send(builder).await?).await?;

        let updated = {
            let mut guard = self.session.write().await;
            guard.as_mut().map(|session| {
                session.user = user.clone();
                session.clone()
            })
        };
        self.events.emit(AuthEvent::UserUpdated, updated);
        Ok(user)
    }

    async fn reset_password(&self, email: &str) -> AuthResult<()> {
        let email = require_email(email)?;
        let builder = self
            .request(reqwest::Method::POST, "/recover", None)
            .json(&json!({ "email": email }));
        self.send(builder).await?;
        info!("Password reset requested");
        Ok(())
    }
}
