//! Conversation engine.
//!
//! Owns the message history and the single outstanding dialogue exchange.
//! Every mutation happens through `&mut self` on the caller's event loop;
//! network work is handed out as [`DialogueRequest`]s and the results come
//! back through [`ConversationEngine::complete_exchange`] and
//! [`ConversationEngine::complete_probe`].
//!
//! # Deferred resumption
//!
//! The dialogue service can answer with a quick reply whose payload is
//! [`AUTH_TRIGGER_PAYLOAD`]. Selecting it while signed out opens the sign-in
//! form instead of sending anything, and the last message the user typed is
//! replayed once the identity changes from signed out to signed in.

use botdesk_client::{
    webhook_url, ClientError, DialogueRequest, RequestMetadata, WebhookPayload, WebhookReply,
};
use botdesk_core::{
    decode_unicode_escapes, ConversationState, ErrorInfo, Message, MessageId,
    PendingAuthResumption, QuickReply, Session,
};
use tracing::{debug, info, warn};

/// Quick-reply payload with which the dialogue service asks for sign-in.
pub const AUTH_TRIGGER_PAYLOAD: &str = "/autenticar_usuario";

/// Sender id used while nobody is signed in.
pub const ANONYMOUS_SENDER: &str = "anonymous";

/// Sender id and text of the connectivity probe.
pub const PROBE_SENDER: &str = "test-connection";
pub const PROBE_MESSAGE: &str = "test";

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5005";

const TRANSPORT_ERROR: &str = "Could not connect to the server";
const PROBE_TRANSPORT_ERROR: &str = "Cannot reach the dialogue server";

/// Called with every bot message appended to history.
pub type BotResponseCallback = Box<dyn FnMut(&Message) + Send>;

/// Called with the outcome of every connectivity probe.
pub type ConnectionCallback = Box<dyn FnMut(bool) + Send>;

/// What selecting a quick reply led to.
#[derive(Debug, Clone, PartialEq)]
pub enum QuickReplyOutcome {
    /// A user message was appended; send this request.
    Sent(DialogueRequest),
    /// The service asked for sign-in; open the auth form.
    AuthRequested,
    /// Nothing happened.
    Ignored,
}

/// Decode escapes for display, keeping the original text if decoding fails.
pub fn decode_for_display(text: &str) -> String {
    match decode_unicode_escapes(text) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, "Showing text without unicode decoding");
            text.to_string()
        }
    }
}

/// Client-side conversation state machine.
pub struct ConversationEngine {
    endpoint: String,
    state: ConversationState,
    pending_auth: PendingAuthResumption,
    /// Sign-in arrived while an exchange was outstanding; replay on completion.
    resume_after_reply: bool,
    next_id: MessageId,
    on_bot_response: Option<BotResponseCallback>,
    on_connection_change: Option<ConnectionCallback>,
}

impl ConversationEngine {
    /// Create an engine talking to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: ConversationState::default(),
            pending_auth: PendingAuthResumption::default(),
            resume_after_reply: false,
            next_id: MessageId::new(1),
            on_bot_response: None,
            on_connection_change: None,
        }
    }

    /// Register the bot-response callback.
    pub fn on_bot_response(&mut self, callback: impl FnMut(&Message) + Send + 'static) {
        self.on_bot_response = Some(Box::new(callback));
    }

    /// Register the connectivity callback.
    pub fn on_connection_change(&mut self, callback: impl FnMut(bool) + Send + 'static) {
        self.on_connection_change = Some(Box::new(callback));
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state.is_awaiting_reply
    }

    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.state.last_error.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected
    }

    pub fn connection_error(&self) -> Option<&ErrorInfo> {
        self.state.connection_error.as_ref()
    }

    pub fn pending_auth(&self) -> &PendingAuthResumption {
        &self.pending_auth
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full URL of the webhook for the current endpoint.
    pub fn webhook_url(&self) -> String {
        webhook_url(&self.endpoint)
    }

    /// Point subsequent exchanges and probes at a new endpoint.
    ///
    /// Returns true when the endpoint actually changed; the caller is
    /// expected to probe it.
    pub fn set_endpoint(&mut self, endpoint: &str) -> bool {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() || endpoint == self.endpoint {
            return false;
        }
        info!(from = %self.endpoint, to = %endpoint, "Endpoint changed");
        self.endpoint = endpoint.to_string();
        true
    }

    fn next_message_id(&mut self) -> MessageId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Append a user message and start an exchange for it.
    ///
    /// Returns `None` without touching any state when the text is blank or a
    /// reply is still outstanding; the caller clears its input line only
    /// when a request comes back.
    pub fn send_user_message(
        &mut self,
        text: &str,
        session: Option<&Session>,
    ) -> Option<DialogueRequest> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring blank message");
            return None;
        }
        if self.state.is_awaiting_reply {
            debug!("Ignoring send while a reply is outstanding");
            return None;
        }

        let id = self.next_message_id();
        self.state
            .messages
            .push(Message::user(id, decode_for_display(text)));
        self.state.is_awaiting_reply = true;
        self.state.last_error = None;
        self.pending_auth = PendingAuthResumption::candidate(text);
        self.resume_after_reply = false;

        debug!(message_id = %id, "User message queued for exchange");
        Some(self.dialogue_request(text, session))
    }

    /// React to a quick-reply button.
    pub fn handle_quick_reply(
        &mut self,
        label: &str,
        payload: &str,
        session: Option<&Session>,
    ) -> QuickReplyOutcome {
        if payload == AUTH_TRIGGER_PAYLOAD {
            if session.is_some() {
                debug!("Auth quick reply while already signed in");
                return QuickReplyOutcome::Ignored;
            }
            // Last write wins if the service asks twice before sign-in.
            self.pending_auth.was_triggered_by_bot = true;
            info!(
                has_original = self.pending_auth.original_message_text.is_some(),
                "Dialogue service requested sign-in"
            );
            return QuickReplyOutcome::AuthRequested;
        }

        if self.state.is_awaiting_reply {
            debug!(label = %label, "Ignoring quick reply while a reply is outstanding");
            return QuickReplyOutcome::Ignored;
        }

        let id = self.next_message_id();
        self.state.messages.push(Message::user(id, label));
        self.state.is_awaiting_reply = true;
        self.state.last_error = None;

        QuickReplyOutcome::Sent(self.dialogue_request(payload, session))
    }

    /// React to an identity change.
    ///
    /// Only a signed-out to signed-in transition with a bot-requested sign-in
    /// pending does anything: the original message is replayed with the new
    /// credentials. No user message is appended for the replay.
    pub fn on_identity_changed(
        &mut self,
        previous: Option<&Session>,
        current: Option<&Session>,
    ) -> Option<DialogueRequest> {
        let signed_in = previous.is_none() && current.is_some();
        if !signed_in || !self.pending_auth.is_ready() {
            return None;
        }

        if self.state.is_awaiting_reply {
            info!("Signed in during an outstanding exchange; replay deferred");
            self.resume_after_reply = true;
            return None;
        }

        self.take_resumption(current)
    }

    fn take_resumption(&mut self, session: Option<&Session>) -> Option<DialogueRequest> {
        let text = self.pending_auth.original_message_text.take()?;
        self.pending_auth.clear();
        self.resume_after_reply = false;
        self.state.is_awaiting_reply = true;
        self.state.last_error = None;

        info!("Replaying original message after sign-in");
        Some(self.dialogue_request(&text, session))
    }

    /// Apply the result of the outstanding exchange.
    ///
    /// May return the replay request if a sign-in happened while the
    /// exchange was in flight.
    pub fn complete_exchange(
        &mut self,
        result: Result<Vec<WebhookReply>, ClientError>,
        session: Option<&Session>,
    ) -> Option<DialogueRequest> {
        if !self.state.is_awaiting_reply {
            warn!("Exchange result arrived with nothing outstanding");
        }
        self.state.is_awaiting_reply = false;

        match result {
            Ok(replies) => self.apply_replies(replies),
            Err(ClientError::Status { status, reason }) => {
                let message = if reason.is_empty() {
                    format!("Error {}", status)
                } else {
                    format!("Error {}: {}", status, reason)
                };
                warn!(status, "Dialogue exchange failed");
                self.state.last_error = Some(ErrorInfo::status(message));
            }
            Err(ClientError::Decode { message, body }) => {
                warn!(error = %message, "Reply was not in the expected format");
                if body.trim().is_empty() {
                    self.state.last_error =
                        Some(ErrorInfo::decode(format!("Unreadable reply: {}", message)));
                } else {
                    self.push_bot_message(body.trim().to_string(), Vec::new());
                }
            }
            Err(e) => {
                warn!(error = %e, "Dialogue exchange got no response");
                self.state.last_error = Some(ErrorInfo::transport(TRANSPORT_ERROR));
            }
        }

        if self.resume_after_reply {
            if session.is_some() {
                return self.take_resumption(session);
            }
            debug!("Deferred replay dropped: signed out before it could run");
            self.resume_after_reply = false;
        }
        None
    }

    fn apply_replies(&mut self, replies: Vec<WebhookReply>) {
        if replies.is_empty() {
            debug!("Dialogue service returned no replies");
            return;
        }

        let text = replies
            .iter()
            .filter_map(|r| r.text.as_deref())
            .map(decode_for_display)
            .collect::<Vec<_>>()
            .join("\n");
        let quick_replies: Vec<QuickReply> = replies
            .into_iter()
            .flat_map(|r| r.buttons.unwrap_or_default())
            .collect();

        self.push_bot_message(text, quick_replies);
    }

    fn push_bot_message(&mut self, text: String, quick_replies: Vec<QuickReply>) {
        let id = self.next_message_id();
        debug!(message_id = %id, quick_replies = quick_replies.len(), "Bot message appended");
        self.state.messages.push(Message::bot(id, text, quick_replies));
        self.state.last_error = None;

        if let (Some(callback), Some(message)) =
            (self.on_bot_response.as_mut(), self.state.messages.last())
        {
            callback(message);
        }
    }

    /// Build the exchange request for `text` with the given identity.
    fn dialogue_request(&self, text: &str, session: Option<&Session>) -> DialogueRequest {
        let message = text.trim().to_string();
        let Some(session) = session else {
            return DialogueRequest {
                payload: WebhookPayload {
                    sender: ANONYMOUS_SENDER.to_string(),
                    message,
                    metadata: None,
                },
                bearer_token: None,
            };
        };

        let token = session.bearer_token();
        let user = &session.user;
        DialogueRequest {
            payload: WebhookPayload {
                sender: user.id.clone(),
                message,
                metadata: Some(RequestMetadata {
                    user_id: user.id.clone(),
                    email: Some(user.email.clone().unwrap_or_default()),
                    user_metadata: Some(user.user_metadata.clone()),
                    authorization: token.map(|t| format!("Bearer {}", t)).unwrap_or_default(),
                }),
            },
            bearer_token: token.map(str::to_string),
        }
    }

    /// Build the lightweight connectivity probe for the current endpoint.
    pub fn probe_request(&self, session: Option<&Session>) -> DialogueRequest {
        let sender = session
            .map(|s| s.user.id.clone())
            .unwrap_or_else(|| PROBE_SENDER.to_string());
        let credentials = session.and_then(|s| s.bearer_token().map(|t| (s, t)));

        DialogueRequest {
            payload: WebhookPayload {
                sender,
                message: PROBE_MESSAGE.to_string(),
                metadata: credentials.map(|(s, token)| RequestMetadata {
                    user_id: s.user.id.clone(),
                    email: None,
                    user_metadata: None,
                    authorization: format!("Bearer {}", token),
                }),
            },
            bearer_token: credentials.map(|(_, token)| token.to_string()),
        }
    }

    /// Apply the result of a connectivity probe.
    ///
    /// Only `is_connected` and `connection_error` change.
    pub fn complete_probe(&mut self, result: Result<Vec<WebhookReply>, ClientError>) {
        let connected = match result {
            // Any 2xx counts, readable or not.
            Ok(_) | Err(ClientError::Decode { .. }) => {
                self.state.connection_error = None;
                true
            }
            Err(ClientError::Status { status, .. }) => {
                self.state.connection_error =
                    Some(ErrorInfo::status(format!("Connection error: {}", status)));
                false
            }
            Err(e) => {
                debug!(error = %e, "Probe got no response");
                self.state.connection_error = Some(ErrorInfo::transport(PROBE_TRANSPORT_ERROR));
                false
            }
        };

        if connected {
            info!(endpoint = %self.endpoint, "Dialogue service reachable");
        } else {
            warn!(endpoint = %self.endpoint, "Dialogue service unreachable");
        }
        self.state.is_connected = connected;

        if let Some(callback) = self.on_connection_change.as_mut() {
            callback(connected);
        }
    }
}

impl Default for ConversationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}
