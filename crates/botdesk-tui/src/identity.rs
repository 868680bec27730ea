//! Identity provider used when no provider is configured.

use async_trait::async_trait;
use serde_json::Value;

use botdesk_client::{AuthEventBus, AuthSubscription, IdentityProvider};
use botdesk_core::{AuthError, AuthErrorKind, AuthResult, Session, User};

const NOT_CONFIGURED: &str = "Sign-in is not configured for this client";

/// Always signed out; every operation fails with a configuration error.
pub struct UnconfiguredIdentity;

fn not_configured<T>() -> AuthResult<T> {
    Err(AuthError::new(AuthErrorKind::Unexpected, NOT_CONFIGURED))
}

#[async_trait]
impl IdentityProvider for UnconfiguredIdentity {
    async fn get_current_session(&self) -> AuthResult<Option<Session>> {
        Ok(None)
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        // The bus is dropped here, so the subscription ends immediately.
        AuthEventBus::new().subscribe()
    }

    async fn sign_in_with_otp(&self, _email: &str) -> AuthResult<()> {
        not_configured()
    }

    async fn verify_otp(&self, _email: &str, _code: &str) -> AuthResult<Session> {
        not_configured()
    }

    async fn sign_out(&self) -> AuthResult<()> {
        Ok(())
    }

    async fn update_profile(&self, _updates: Value) -> AuthResult<User> {
        not_configured()
    }

    async fn reset_password(&self, _email: &str) -> AuthResult<()> {
        not_configured()
    }
}
