//! Identity session store.
//!
//! A single observable value ([`IdentitySnapshot`]) kept in a `watch`
//! channel. The store subscribes once to the provider's auth-state stream and
//! folds every event into the snapshot; consumers read it explicitly or
//! subscribe to be woken on change.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use botdesk_client::{token_preview, IdentityProvider};
use botdesk_core::{AuthEvent, AuthResult, AuthStateChange, Session, User};

/// Point-in-time view of who is signed in and which identity panels are open.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentitySnapshot {
    pub session: Option<Session>,
    /// True until the initial session lookup finishes.
    pub loading: bool,
    pub auth_modal_open: bool,
    pub profile_open: bool,
    pub last_event: Option<AuthEvent>,
}

impl Default for IdentitySnapshot {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
            auth_modal_open: false,
            profile_open: false,
            last_event: None,
        }
    }
}

impl IdentitySnapshot {
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Fold one auth-state change into the snapshot.
    pub fn apply(&mut self, change: AuthStateChange) {
        if change.event == AuthEvent::SignedIn && change.session.is_some() {
            self.auth_modal_open = false;
        }
        if change.session.is_none() {
            self.profile_open = false;
        }
        self.session = change.session;
        self.last_event = Some(change.event);
        self.loading = false;
    }
}

/// Observable identity state backed by an [`IdentityProvider`].
pub struct IdentityStore {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<IdentitySnapshot>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl IdentityStore {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (tx, _) = watch::channel(IdentitySnapshot::default());
        Self {
            provider,
            state: Arc::new(tx),
            listener: Mutex::new(None),
        }
    }

    /// Subscribe to the provider and resolve the initial session.
    ///
    /// Must be called from within a tokio runtime. Calling it again replaces
    /// the previous subscription.
    pub async fn start(&self) {
        // Subscribe before the lookup so no event between the two is lost.
        let mut subscription = self.provider.on_auth_state_change();
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            while let Some(change) = subscription.recv().await {
                info!(
                    event = %change.event,
                    user_id = ?change.session.as_ref().map(|s| s.user.id.as_str()),
                    "Identity changed"
                );
                state.send_modify(|snapshot| snapshot.apply(change));
            }
            debug!("Auth event stream ended");
        });
        self.replace_listener(Some(handle));

        let initial = match self.provider.get_current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Initial session lookup failed");
                None
            }
        };
        if let Some(token) = initial.as_ref().and_then(Session::bearer_token) {
            debug!(token = %token_preview(token), "Restored session");
        }

        // An event may already have resolved the session; it wins.
        self.state.send_if_modified(|snapshot| {
            if !snapshot.loading {
                return false;
            }
            snapshot.apply(AuthStateChange {
                event: AuthEvent::InitialSession,
                session: initial,
            });
            true
        });
    }

    fn replace_listener(&self, handle: Option<JoinHandle<()>>) {
        let previous = match self.listener.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, handle),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Stop listening to auth-state changes.
    pub fn shutdown(&self) {
        self.replace_listener(None);
    }

    pub fn subscribe(&self) -> watch::Receiver<IdentitySnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> IdentitySnapshot {
        self.state.borrow().clone()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn open_auth_modal(&self) {
        self.state.send_if_modified(|s| !std::mem::replace(&mut s.auth_modal_open, true));
    }

    pub fn close_auth_modal(&self) {
        self.state.send_if_modified(|s| std::mem::replace(&mut s.auth_modal_open, false));
    }

    /// Show the profile panel. Ignored while signed out.
    pub fn open_profile(&self) {
        self.state.send_if_modified(|s| {
            if s.session.is_none() || s.profile_open {
                return false;
            }
            s.profile_open = true;
            true
        });
    }

    pub fn close_profile(&self) {
        self.state.send_if_modified(|s| std::mem::replace(&mut s.profile_open, false));
    }

    pub async fn request_otp(&self, email: &str) -> AuthResult<()> {
        self.provider.sign_in_with_otp(email).await
    }

    /// Verify a passcode. The resulting `SIGNED_IN` event updates the store.
    pub async fn verify_otp(&self, email: &str, code: &str) -> AuthResult<Session> {
        self.provider.verify_otp(email, code).await
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        self.provider.sign_out().await
    }

    pub async fn update_profile(&self, updates: Value) -> AuthResult<User> {
        self.provider.update_profile(updates).await
    }

    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        self.provider.reset_password(email).await
    }
}

impl Drop for IdentityStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use botdesk_client::{AuthEventBus, AuthSubscription};
    use botdesk_core::{AuthError, AuthErrorKind};
    use tokio::sync::Mutex as AsyncMutex;

    struct FakeProvider {
        events: AuthEventBus,
        session: AsyncMutex<Option<Session>>,
    }

    impl FakeProvider {
        fn new(initial: Option<Session>) -> Self {
            Self {
                events: AuthEventBus::new(),
                session: AsyncMutex::new(initial),
            }
        }
    }

    fn session() -> Session {
        Session {
            access_token: "tok-1".into(),
            refresh_token: None,
            token_type: "bearer".into(),
            expires_in: None,
            user: User::new("u-1", "ana@example.com"),
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn get_current_session(&self) -> AuthResult<Option<Session>> {
            Ok(self.session.lock().await.clone())
        }

        fn on_auth_state_change(&self) -> AuthSubscription {
            self.events.subscribe()
        }

        async fn sign_in_with_otp(&self, email: &str) -> AuthResult<()> {
            if email.is_empty() {
                return Err(AuthError::new(AuthErrorKind::InvalidInput, "Email is required"));
            }
            Ok(())
        }

        async fn verify_otp(&self, _email: &str, code: &str) -> AuthResult<Session> {
            if code != "123456" {
                return Err(AuthError::new(AuthErrorKind::Rejected, "Invalid code"));
            }
            let session = session();
            *self.session.lock().await = Some(session.clone());
            self.events.emit(AuthEvent::SignedIn, Some(session.clone()));
            Ok(session)
        }

        async fn sign_out(&self) -> AuthResult<()> {
            *self.session.lock().await = None;
            self.events.emit(AuthEvent::SignedOut, None);
            Ok(())
        }

        async fn update_profile(&self, _updates: Value) -> AuthResult<User> {
            Err(AuthError::new(AuthErrorKind::NotAuthenticated, "Not signed in"))
        }

        async fn reset_password(&self, _email: &str) -> AuthResult<()> {
            Ok(())
        }
    }

    async fn changed(rx: &mut watch::Receiver<IdentitySnapshot>) -> IdentitySnapshot {
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("timed out waiting for identity change")
            .unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test]
    async fn test_start_resolves_loading_without_session() {
        let store = IdentityStore::new(Arc::new(FakeProvider::new(None)));
        assert!(store.snapshot().loading);

        store.start().await;

        let snapshot = store.snapshot();
        assert!(!snapshot.loading);
        assert!(!snapshot.is_authenticated());
        assert_eq!(snapshot.last_event, Some(AuthEvent::InitialSession));
    }

    #[tokio::test]
    async fn test_start_restores_existing_session() {
        let store = IdentityStore::new(Arc::new(FakeProvider::new(Some(session()))));
        store.start().await;
        assert_eq!(store.current_session(), Some(session()));
    }

    #[tokio::test]
    async fn test_sign_in_event_closes_auth_modal() {
        let store = IdentityStore::new(Arc::new(FakeProvider::new(None)));
        store.start().await;
        store.open_auth_modal();
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.verify_otp("ana@example.com", "123456").await.unwrap();

        let snapshot = changed(&mut rx).await;
        assert!(snapshot.is_authenticated());
        assert!(!snapshot.auth_modal_open);
        assert_eq!(snapshot.last_event, Some(AuthEvent::SignedIn));
    }

    #[tokio::test]
    async fn test_failed_verification_leaves_state_alone() {
        let store = IdentityStore::new(Arc::new(FakeProvider::new(None)));
        store.start().await;
        store.open_auth_modal();

        let err = store.verify_otp("ana@example.com", "000000").await.unwrap_err();

        assert_eq!(err.message, "Invalid code");
        let snapshot = store.snapshot();
        assert!(snapshot.auth_modal_open);
        assert!(!snapshot.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_and_closes_profile() {
        let store = IdentityStore::new(Arc::new(FakeProvider::new(Some(session()))));
        store.start().await;
        store.open_profile();
        assert!(store.snapshot().profile_open);
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.sign_out().await.unwrap();

        let snapshot = changed(&mut rx).await;
        assert!(!snapshot.is_authenticated());
        assert!(!snapshot.profile_open);
        assert_eq!(snapshot.last_event, Some(AuthEvent::SignedOut));
    }

    #[tokio::test]
    async fn test_profile_cannot_open_while_signed_out() {
        let store = IdentityStore::new(Arc::new(FakeProvider::new(None)));
        store.start().await;
        store.open_profile();
        assert!(!store.snapshot().profile_open);
    }

    #[tokio::test]
    async fn test_shutdown_stops_following_events() {
        let provider = Arc::new(FakeProvider::new(None));
        let store = IdentityStore::new(provider.clone());
        store.start().await;
        store.shutdown();
        tokio::task::yield_now().await;

        provider.events.emit(AuthEvent::SignedIn, Some(session()));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!store.snapshot().is_authenticated());
    }

    #[test]
    fn test_apply_user_updated_keeps_modal_state() {
        let mut snapshot = IdentitySnapshot {
            session: Some(session()),
            loading: false,
            auth_modal_open: false,
            profile_open: true,
            last_event: Some(AuthEvent::SignedIn),
        };
        let mut updated = session();
        updated.user.email = Some("new@example.com".into());

        snapshot.apply(AuthStateChange {
            event: AuthEvent::UserUpdated,
            session: Some(updated),
        });

        assert!(snapshot.profile_open);
        assert_eq!(
            snapshot.user().and_then(|u| u.email.as_deref()),
            Some("new@example.com")
        );
    }
}
