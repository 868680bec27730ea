//! Event types for communication between the backend and the UI.

use botdesk_client::{ClientError, DialogueRequest, WebhookReply};
use botdesk_core::{AuthResult, Session};

/// Events sent from the backend to the UI thread.
#[derive(Debug)]
pub enum UiEvent {
    /// The outstanding dialogue exchange finished.
    ExchangeCompleted(Result<Vec<WebhookReply>, ClientError>),

    /// A connectivity probe finished for `endpoint`.
    ProbeCompleted {
        endpoint: String,
        result: Result<Vec<WebhookReply>, ClientError>,
    },

    /// A passcode request finished.
    OtpRequested(AuthResult<()>),

    /// A passcode verification finished.
    OtpVerified(AuthResult<Session>),

    /// Sign-out finished.
    SignedOut(AuthResult<()>),
}

/// Commands sent from the UI to the backend.
#[derive(Debug)]
pub enum BackendCommand {
    /// Send one dialogue request.
    Exchange {
        endpoint: String,
        request: DialogueRequest,
    },

    /// Probe the dialogue service.
    Probe {
        endpoint: String,
        request: DialogueRequest,
    },

    /// Email a passcode.
    RequestOtp { email: String },

    /// Verify a passcode.
    VerifyOtp { email: String, code: String },

    /// End the current session.
    SignOut,

    /// Quit the application.
    Quit,
}
