//! Application state and main event loop.

use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use botdesk_client::{ClientError, DialogueRequest};
use botdesk_engine::identity::IdentitySnapshot;
use botdesk_engine::{
    AuthRequest, AuthStep, ConversationEngine, FormOutcome, IdentityStore, QuickReplyOutcome,
};
use botdesk_tui_components::LineEditor;

use crate::config::ChatConfig;
use crate::event::{BackendCommand, UiEvent};
use crate::state::{Focus, QuickReplyCursor, UiState};
use crate::ui;

/// Main application: conversation engine, screen state and channel handles.
pub struct App {
    config: ChatConfig,
    engine: ConversationEngine,
    state: UiState,

    /// Used for modal visibility; identity I/O goes through the backend.
    identity: Arc<IdentityStore>,
    identity_rx: watch::Receiver<IdentitySnapshot>,

    /// Receiver for events from the backend.
    ui_rx: mpsc::Receiver<UiEvent>,

    /// Sender for commands to the backend.
    cmd_tx: mpsc::Sender<BackendCommand>,

    should_quit: bool,
}

impl App {
    pub fn new(
        config: ChatConfig,
        identity: Arc<IdentityStore>,
        ui_rx: mpsc::Receiver<UiEvent>,
        cmd_tx: mpsc::Sender<BackendCommand>,
    ) -> Self {
        let mut engine = ConversationEngine::new(config.endpoint.clone());
        engine.on_bot_response(|message| {
            debug!(
                message_id = %message.id(),
                quick_replies = message.quick_replies().len(),
                "Bot replied"
            );
        });
        engine.on_connection_change(|connected| {
            info!(connected, "Dialogue service connectivity");
        });

        let identity_rx = identity.subscribe();
        let state = UiState {
            identity: identity_rx.borrow().clone(),
            ..UiState::default()
        };

        Self {
            config,
            engine,
            state,
            identity,
            identity_rx,
            ui_rx,
            cmd_tx,
            should_quit: false,
        }
    }

    /// Run the main event loop.
    ///
    /// This runs on the main thread and handles:
    /// - Drawing the UI
    /// - Processing keyboard input
    /// - Receiving results from the backend
    /// - Following identity changes
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> std::io::Result<()> {
        self.probe();

        loop {
            self.sync_identity();

            terminal.draw(|frame| ui::render(frame, &self.config, &self.engine, &self.state))?;

            // Poll terminal events (non-blocking with short timeout)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            // Process backend events (non-blocking)
            while let Ok(event) = self.ui_rx.try_recv() {
                self.apply_event(event);
            }

            if self.should_quit {
                break;
            }
        }

        // Send quit command to backend
        let _ = self.cmd_tx.blocking_send(BackendCommand::Quit);

        Ok(())
    }

    fn send(&self, cmd: BackendCommand) -> bool {
        if let Err(e) = self.cmd_tx.blocking_send(cmd) {
            error!(command = ?e.0, "Backend is not running");
            return false;
        }
        true
    }

    fn send_exchange(&mut self, request: DialogueRequest) {
        let cmd = BackendCommand::Exchange {
            endpoint: self.engine.endpoint().to_string(),
            request,
        };
        if !self.send(cmd) {
            // Keep the awaiting flag from sticking forever.
            let session = self.state.identity.session.clone();
            self.engine.complete_exchange(
                Err(ClientError::Connection("backend stopped".to_string())),
                session.as_ref(),
            );
        }
    }

    /// Probe the current endpoint with the current identity.
    fn probe(&mut self) {
        let request = self.engine.probe_request(self.state.identity.session.as_ref());
        self.send(BackendCommand::Probe {
            endpoint: self.engine.endpoint().to_string(),
            request,
        });
    }

    /// Pick up a new identity snapshot and react to transitions.
    fn sync_identity(&mut self) {
        if !matches!(self.identity_rx.has_changed(), Ok(true)) {
            return;
        }
        let current = self.identity_rx.borrow_and_update().clone();
        let previous = std::mem::replace(&mut self.state.identity, current);

        if previous.auth_modal_open && !self.state.identity.auth_modal_open {
            self.state.auth_form.reset();
        }

        let replay = self.engine.on_identity_changed(
            previous.session.as_ref(),
            self.state.identity.session.as_ref(),
        );
        if let Some(request) = replay {
            self.state.follow_newest();
            self.send_exchange(request);
        }

        let previous_user = previous.user().map(|u| u.id.as_str());
        let current_user = self.state.identity.user().map(|u| u.id.as_str());
        if previous_user != current_user {
            info!(user_id = ?current_user, "Signed-in user changed");
            self.probe();
        }
    }

    /// Apply an event from the backend.
    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::ExchangeCompleted(result) => {
                let session = self.state.identity.session.clone();
                let replay = self.engine.complete_exchange(result, session.as_ref());
                self.state.follow_newest();
                if let Some(request) = replay {
                    self.send_exchange(request);
                }
            }
            UiEvent::ProbeCompleted { endpoint, result } => {
                if endpoint != self.engine.endpoint() {
                    debug!(endpoint = %endpoint, "Ignoring probe for a previous endpoint");
                    return;
                }
                self.engine.complete_probe(result);
            }
            UiEvent::OtpRequested(result) => {
                self.state.auth_form.complete_request_otp(result);
            }
            UiEvent::OtpVerified(result) => {
                if self.state.auth_form.complete_verify_otp(result) == FormOutcome::Close {
                    self.identity.close_auth_modal();
                    self.sync_identity();
                }
            }
            UiEvent::SignedOut(result) => {
                self.state.status_message = Some(match result {
                    Ok(()) => "Signed out".to_string(),
                    Err(e) => format!("Sign out failed: {}", e),
                });
            }
        }
    }

    /// Handle a key press.
    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            self.should_quit = true;
            return;
        }
        self.state.status_message = None;

        if self.state.confirm_sign_out {
            self.handle_confirm_key(key.code);
        } else if self.state.identity.auth_modal_open {
            self.handle_auth_key(key.code);
        } else if self.state.identity.profile_open {
            self.handle_profile_key(key.code);
        } else if self.state.config_input.is_some() {
            self.handle_config_key(key.code);
        } else if ctrl {
            match key.code {
                KeyCode::Char('l') => self.open_account(),
                KeyCode::Char('e') => {
                    self.state.config_input = Some(LineEditor::new(self.engine.endpoint()));
                }
                KeyCode::Char('r') => self.probe(),
                _ => {}
            }
        } else {
            match self.state.focus {
                Focus::Input => self.handle_input_key(key.code),
                Focus::QuickReplies => self.handle_quick_reply_key(key.code),
            }
        }
    }

    /// Login button when signed out, profile when signed in.
    fn open_account(&mut self) {
        if self.state.identity.loading {
            return;
        }
        if self.state.identity.is_authenticated() {
            self.identity.open_profile();
        } else {
            self.identity.open_auth_modal();
        }
        self.sync_identity();
    }

    /// History indices of messages that carry quick replies, oldest first.
    fn messages_with_quick_replies(&self) -> Vec<usize> {
        self.engine
            .messages()
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.quick_replies().is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    fn quick_reply_count(&self, message: usize) -> usize {
        self.engine
            .messages()
            .get(message)
            .map(|m| m.quick_replies().len())
            .unwrap_or(0)
    }

    fn handle_input_key(&mut self, code: KeyCode) {
        let locked = self.engine.is_awaiting_reply();
        match code {
            KeyCode::Enter => self.submit_input(),
            KeyCode::Tab => {
                if let Some(&newest) = self.messages_with_quick_replies().last() {
                    self.state.focus = Focus::QuickReplies;
                    self.state.selected_quick_reply = QuickReplyCursor {
                        message: newest,
                        button: 0,
                    };
                }
            }
            KeyCode::Char(c) if !locked => self.state.input.insert(c),
            KeyCode::Backspace if !locked => self.state.input.backspace(),
            KeyCode::Delete if !locked => self.state.input.delete(),
            KeyCode::Left => self.state.input.move_left(),
            KeyCode::Right => self.state.input.move_right(),
            KeyCode::Home => self.state.input.home(),
            KeyCode::End => self.state.input.end(),
            KeyCode::Up => self.state.scroll_up(1),
            KeyCode::Down => self.state.scroll_down(1),
            KeyCode::PageUp => self.state.scroll_up(10),
            KeyCode::PageDown => self.state.scroll_down(10),
            _ => {}
        }
    }

    /// Rejected input (blank, or a reply still outstanding) stays in the line.
    fn submit_input(&mut self) {
        let session = self.state.identity.session.clone();
        let sent = self
            .engine
            .send_user_message(self.state.input.value(), session.as_ref());
        if let Some(request) = sent {
            self.state.input.clear();
            self.state.follow_newest();
            self.send_exchange(request);
        }
    }

    fn handle_quick_reply_key(&mut self, code: KeyCode) {
        let rows = self.messages_with_quick_replies();
        let cursor = self.state.selected_quick_reply;
        let Some(row) = rows.iter().position(|&i| i == cursor.message) else {
            self.state.focus = Focus::Input;
            return;
        };
        let count = self.quick_reply_count(cursor.message);
        let select_row = |message: usize| QuickReplyCursor { message, button: 0 };

        match code {
            KeyCode::Left => {
                self.state.selected_quick_reply.button = cursor.button.saturating_sub(1);
            }
            KeyCode::Right => {
                self.state.selected_quick_reply.button = (cursor.button + 1).min(count - 1);
            }
            KeyCode::Up if row > 0 => {
                self.state.selected_quick_reply = select_row(rows[row - 1]);
            }
            KeyCode::Down => {
                if let Some(&next) = rows.get(row + 1) {
                    self.state.selected_quick_reply = select_row(next);
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_quick_reply(),
            KeyCode::Tab | KeyCode::Esc => self.state.focus = Focus::Input,
            _ => {}
        }
    }

    fn activate_quick_reply(&mut self) {
        let cursor = self.state.selected_quick_reply;
        let selected = self
            .engine
            .messages()
            .get(cursor.message)
            .and_then(|m| m.quick_replies().get(cursor.button))
            .map(|q| (q.label.clone(), q.payload.clone()));
        let Some((label, payload)) = selected else {
            return;
        };

        let session = self.state.identity.session.clone();
        match self.engine.handle_quick_reply(&label, &payload, session.as_ref()) {
            QuickReplyOutcome::Sent(request) => {
                self.state.follow_newest();
                self.send_exchange(request);
            }
            QuickReplyOutcome::AuthRequested => {
                self.state.focus = Focus::Input;
                self.identity.open_auth_modal();
                self.sync_identity();
            }
            QuickReplyOutcome::Ignored => {}
        }
    }

    fn close_auth(&mut self) {
        self.identity.close_auth_modal();
        self.state.auth_form.reset();
        self.sync_identity();
    }

    fn handle_auth_key(&mut self, code: KeyCode) {
        let form = &mut self.state.auth_form;
        match code {
            KeyCode::Esc => {
                if form.step() == AuthStep::Otp && !form.is_loading() {
                    form.back_to_email();
                } else {
                    self.close_auth();
                }
            }
            KeyCode::Enter => {
                let cmd = match form.submit() {
                    Some(AuthRequest::RequestOtp { email }) => BackendCommand::RequestOtp { email },
                    Some(AuthRequest::VerifyOtp { email, code }) => {
                        BackendCommand::VerifyOtp { email, code }
                    }
                    None => return,
                };
                self.send(cmd);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.input_char(c),
            _ => {}
        }
    }

    fn handle_profile_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.identity.close_profile();
                self.sync_identity();
            }
            KeyCode::Char('s') => self.state.confirm_sign_out = true,
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.state.confirm_sign_out = false;
                self.state.status_message = Some("Signing out...".to_string());
                self.send(BackendCommand::SignOut);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state.confirm_sign_out = false;
            }
            _ => {}
        }
    }

    fn handle_config_key(&mut self, code: KeyCode) {
        let Some(editor) = self.state.config_input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => self.state.config_input = None,
            KeyCode::Enter => {
                let value = editor.value().to_string();
                self.state.config_input = None;
                if self.engine.set_endpoint(&value) {
                    self.state.status_message =
                        Some(format!("Endpoint set to {}", self.engine.endpoint()));
                }
                self.probe();
            }
            KeyCode::Char(c) => editor.insert(c),
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Delete => editor.delete(),
            KeyCode::Left => editor.move_left(),
            KeyCode::Right => editor.move_right(),
            KeyCode::Home => editor.home(),
            KeyCode::End => editor.end(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use serde_json::Value;

    use botdesk_client::{AuthEventBus, AuthSubscription, IdentityProvider, WebhookReply};
    use botdesk_core::{AuthError, AuthErrorKind, AuthEvent, AuthResult, QuickReply, Session, User};
    use botdesk_engine::AUTH_TRIGGER_PAYLOAD;

    use crate::identity::UnconfiguredIdentity;

    /// Accepts the code "123456" and announces the sign-in on its event bus.
    struct OtpIdentity {
        events: AuthEventBus,
    }

    fn signed_in_session() -> Session {
        Session {
            access_token: "tok-1".into(),
            refresh_token: None,
            token_type: "bearer".into(),
            expires_in: Some(3600),
            user: User::new("u-1", "ana@example.com"),
        }
    }

    #[async_trait]
    impl IdentityProvider for OtpIdentity {
        async fn get_current_session(&self) -> AuthResult<Option<Session>> {
            Ok(None)
        }

        fn on_auth_state_change(&self) -> AuthSubscription {
            self.events.subscribe()
        }

        async fn sign_in_with_otp(&self, _email: &str) -> AuthResult<()> {
            Ok(())
        }

        async fn verify_otp(&self, _email: &str, code: &str) -> AuthResult<Session> {
            if code != "123456" {
                return Err(AuthError::new(AuthErrorKind::Rejected, "Invalid code"));
            }
            let session = signed_in_session();
            self.events.emit(AuthEvent::SignedIn, Some(session.clone()));
            Ok(session)
        }

        async fn sign_out(&self) -> AuthResult<()> {
            Ok(())
        }

        async fn update_profile(&self, _updates: Value) -> AuthResult<User> {
            Ok(signed_in_session().user)
        }

        async fn reset_password(&self, _email: &str) -> AuthResult<()> {
            Ok(())
        }
    }

    fn app() -> (App, mpsc::Sender<UiEvent>, mpsc::Receiver<BackendCommand>) {
        let (ui_tx, ui_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let identity = Arc::new(IdentityStore::new(Arc::new(UnconfiguredIdentity)));
        let app = App::new(ChatConfig::default(), identity, ui_rx, cmd_tx);
        (app, ui_tx, cmd_rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        text.chars().for_each(|c| press(app, KeyCode::Char(c)));
    }

    fn take_exchange(cmd_rx: &mut mpsc::Receiver<BackendCommand>) -> DialogueRequest {
        match cmd_rx.try_recv() {
            Ok(BackendCommand::Exchange { request, .. }) => request,
            other => panic!("Expected Exchange, got {:?}", other),
        }
    }

    fn take_probe(cmd_rx: &mut mpsc::Receiver<BackendCommand>) -> DialogueRequest {
        match cmd_rx.try_recv() {
            Ok(BackendCommand::Probe { request, .. }) => request,
            other => panic!("Expected Probe, got {:?}", other),
        }
    }

    fn auth_challenge() -> UiEvent {
        UiEvent::ExchangeCompleted(Ok(vec![WebhookReply::text("Sign in first")
            .with_buttons(vec![QuickReply::new("Sign in", AUTH_TRIGGER_PAYLOAD)])]))
    }

    #[test]
    fn test_enter_sends_message_and_clears_input() {
        let (mut app, _ui_tx, mut cmd_rx) = app();
        type_text(&mut app, "hello");
        press(&mut app, KeyCode::Enter);

        let request = take_exchange(&mut cmd_rx);
        assert_eq!(request.payload.message, "hello");
        assert!(app.state.input.is_empty());
        assert!(app.engine.is_awaiting_reply());

        // Input is locked until the reply arrives.
        type_text(&mut app, "x");
        assert!(app.state.input.is_empty());

        app.apply_event(UiEvent::ExchangeCompleted(Ok(vec![WebhookReply::text("hi!")])));
        assert!(!app.engine.is_awaiting_reply());
        assert_eq!(app.engine.messages().len(), 2);
    }

    #[test]
    fn test_blank_input_is_kept_and_not_sent() {
        let (mut app, _ui_tx, mut cmd_rx) = app();
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(app.state.input.value(), "   ");
        assert!(app.engine.messages().is_empty());
    }

    #[test]
    fn test_auth_quick_reply_opens_sign_in() {
        let (mut app, _ui_tx, mut cmd_rx) = app();
        type_text(&mut app, "balance");
        press(&mut app, KeyCode::Enter);
        take_exchange(&mut cmd_rx);
        app.apply_event(auth_challenge());

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.state.focus, Focus::QuickReplies);
        press(&mut app, KeyCode::Enter);

        assert!(app.state.identity.auth_modal_open);
        assert!(cmd_rx.try_recv().is_err());

        type_text(&mut app, "ana@example.com");
        press(&mut app, KeyCode::Enter);
        match cmd_rx.try_recv() {
            Ok(BackendCommand::RequestOtp { email }) => assert_eq!(email, "ana@example.com"),
            other => panic!("Expected RequestOtp, got {:?}", other),
        }

        press(&mut app, KeyCode::Esc);
        assert!(!app.state.identity.auth_modal_open);
    }

    #[test]
    fn test_quick_reply_sends_payload() {
        let (mut app, _ui_tx, mut cmd_rx) = app();
        type_text(&mut app, "menu");
        press(&mut app, KeyCode::Enter);
        take_exchange(&mut cmd_rx);
        app.apply_event(UiEvent::ExchangeCompleted(Ok(vec![WebhookReply::text("Pick")
            .with_buttons(vec![
                QuickReply::new("Yes", "/affirm"),
                QuickReply::new("No", "/deny"),
            ])])));

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(take_exchange(&mut cmd_rx).payload.message, "/deny");
        assert_eq!(app.engine.messages().last().unwrap().text(), "No");
        assert_eq!(app.state.focus, Focus::Input);
    }

    #[test]
    fn test_quick_reply_on_older_message_can_be_selected() {
        let (mut app, _ui_tx, mut cmd_rx) = app();
        type_text(&mut app, "menu");
        press(&mut app, KeyCode::Enter);
        take_exchange(&mut cmd_rx);
        app.apply_event(UiEvent::ExchangeCompleted(Ok(vec![
            WebhookReply::text("Pick a size")
                .with_buttons(vec![QuickReply::new("Small", "/small")]),
            WebhookReply::text("Or a colour")
                .with_buttons(vec![QuickReply::new("Red", "/red")]),
        ])));
        // Both button sets land on one bot message (index 1).
        type_text(&mut app, "more");
        press(&mut app, KeyCode::Enter);
        take_exchange(&mut cmd_rx);
        app.apply_event(UiEvent::ExchangeCompleted(Ok(vec![WebhookReply::text("Ok")
            .with_buttons(vec![QuickReply::new("Thanks", "/thanks")])])));

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.state.selected_quick_reply.message, 3);
        press(&mut app, KeyCode::Up);
        assert_eq!(
            app.state.selected_quick_reply,
            QuickReplyCursor { message: 1, button: 0 }
        );
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(take_exchange(&mut cmd_rx).payload.message, "/red");
        assert_eq!(app.engine.messages().last().unwrap().text(), "Red");
    }

    #[test]
    fn test_sign_in_replays_message_and_reprobes() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let identity = Arc::new(IdentityStore::new(Arc::new(OtpIdentity {
            events: AuthEventBus::new(),
        })));
        rt.block_on(identity.start());

        let (_ui_tx, ui_rx) = mpsc::channel(16);
        let (cmd_tx, mut cmd_rx) = mpsc::channel(16);
        let mut app = App::new(ChatConfig::default(), Arc::clone(&identity), ui_rx, cmd_tx);

        type_text(&mut app, "balance");
        press(&mut app, KeyCode::Enter);
        take_exchange(&mut cmd_rx);
        app.apply_event(auth_challenge());
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        assert!(app.state.identity.auth_modal_open);
        assert!(cmd_rx.try_recv().is_err());

        rt.block_on(async {
            identity.verify_otp("ana@example.com", "123456").await.unwrap();
            let mut rx = identity.subscribe();
            tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.is_authenticated()))
                .await
                .expect("sign-in reached the store")
                .map(|_| ())
                .unwrap();
        });
        app.sync_identity();

        let replay = take_exchange(&mut cmd_rx);
        assert_eq!(replay.payload.message, "balance");
        assert_eq!(replay.payload.sender, "u-1");
        assert_eq!(replay.bearer_token.as_deref(), Some("tok-1"));

        let probe = take_probe(&mut cmd_rx);
        assert_eq!(probe.payload.sender, "u-1");

        assert!(!app.state.identity.auth_modal_open);
        // The replay does not add another user message.
        assert_eq!(app.engine.messages().len(), 2);
        assert!(app.engine.is_awaiting_reply());
    }

    #[test]
    fn test_endpoint_change_probes_new_endpoint() {
        let (mut app, _ui_tx, mut cmd_rx) = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::CONTROL));
        assert!(app.state.config_input.is_some());

        for _ in 0..app.engine.endpoint().chars().count() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "http://rasa:5005");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.engine.endpoint(), "http://rasa:5005");
        match cmd_rx.try_recv() {
            Ok(BackendCommand::Probe { endpoint, .. }) => assert_eq!(endpoint, "http://rasa:5005"),
            other => panic!("Expected Probe, got {:?}", other),
        }
    }

    #[test]
    fn test_probe_for_old_endpoint_is_ignored() {
        let (mut app, _ui_tx, _cmd_rx) = app();
        app.engine.set_endpoint("http://new:5005");

        app.apply_event(UiEvent::ProbeCompleted {
            endpoint: "http://localhost:5005".into(),
            result: Ok(Vec::new()),
        });
        assert!(!app.engine.is_connected());

        app.apply_event(UiEvent::ProbeCompleted {
            endpoint: "http://new:5005".into(),
            result: Ok(Vec::new()),
        });
        assert!(app.engine.is_connected());
    }

    #[test]
    fn test_sign_out_requires_confirmation() {
        let (mut app, _ui_tx, mut cmd_rx) = app();
        app.state.confirm_sign_out = true;
        press(&mut app, KeyCode::Char('n'));
        assert!(!app.state.confirm_sign_out);
        assert!(cmd_rx.try_recv().is_err());

        app.state.confirm_sign_out = true;
        press(&mut app, KeyCode::Char('y'));
        assert!(!app.state.confirm_sign_out);
        assert!(matches!(cmd_rx.try_recv(), Ok(BackendCommand::SignOut)));
    }

    #[test]
    fn test_account_key_ignored_while_identity_loading() {
        let (mut app, _ui_tx, _cmd_rx) = app();
        assert!(app.state.identity.loading);
        app.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));
        assert!(!app.state.identity.auth_modal_open);
    }
}
