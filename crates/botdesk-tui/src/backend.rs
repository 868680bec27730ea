//! Background task that performs all network work for the UI.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use botdesk_client::{token_preview, DialogueService};
use botdesk_engine::IdentityStore;

use crate::event::{BackendCommand, UiEvent};

/// Run the backend loop.
///
/// Runs in a separate thread with its own tokio runtime. Each command is
/// handled on its own task so a slow dialogue exchange never holds up a
/// probe or a sign-in; results go back to the UI over `ui_tx`.
pub async fn run_backend(
    identity: Arc<IdentityStore>,
    dialogue: Arc<dyn DialogueService>,
    ui_tx: mpsc::Sender<UiEvent>,
    mut cmd_rx: mpsc::Receiver<BackendCommand>,
) {
    identity.start().await;
    info!(
        signed_in = identity.current_session().is_some(),
        "Identity store ready"
    );

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            BackendCommand::Quit => {
                info!("Received quit command, shutting down backend");
                break;
            }
            BackendCommand::Exchange { endpoint, request } => {
                debug!(
                    sender = %request.payload.sender,
                    token = ?request.bearer_token.as_deref().map(token_preview),
                    "Sending message"
                );
                let dialogue = Arc::clone(&dialogue);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let result = dialogue.exchange(&endpoint, &request).await;
                    if let Err(e) = &result {
                        warn!(error = %e, "Dialogue exchange failed");
                    }
                    let _ = ui_tx.send(UiEvent::ExchangeCompleted(result)).await;
                });
            }
            BackendCommand::Probe { endpoint, request } => {
                let dialogue = Arc::clone(&dialogue);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let result = dialogue.exchange(&endpoint, &request).await;
                    let _ = ui_tx.send(UiEvent::ProbeCompleted { endpoint, result }).await;
                });
            }
            BackendCommand::RequestOtp { email } => {
                let identity = Arc::clone(&identity);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let result = identity.request_otp(&email).await;
                    let _ = ui_tx.send(UiEvent::OtpRequested(result)).await;
                });
            }
            BackendCommand::VerifyOtp { email, code } => {
                let identity = Arc::clone(&identity);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let result = identity.verify_otp(&email, &code).await;
                    let _ = ui_tx.send(UiEvent::OtpVerified(result)).await;
                });
            }
            BackendCommand::SignOut => {
                let identity = Arc::clone(&identity);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let result = identity.sign_out().await;
                    let _ = ui_tx.send(UiEvent::SignedOut(result)).await;
                });
            }
        }
    }

    identity.shutdown();
    info!("Backend shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use botdesk_client::{ClientError, DialogueRequest, WebhookReply};
    use botdesk_engine::ConversationEngine;

    use crate::identity::UnconfiguredIdentity;

    struct EchoService;

    #[async_trait]
    impl DialogueService for EchoService {
        async fn exchange(
            &self,
            endpoint: &str,
            request: &DialogueRequest,
        ) -> Result<Vec<WebhookReply>, ClientError> {
            if endpoint.contains("down") {
                return Err(ClientError::Connection("refused".into()));
            }
            Ok(vec![WebhookReply::text(format!("echo: {}", request.payload.message))])
        }
    }

    fn spawn_backend() -> (mpsc::Sender<BackendCommand>, mpsc::Receiver<UiEvent>) {
        let (ui_tx, ui_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let identity = Arc::new(IdentityStore::new(Arc::new(UnconfiguredIdentity)));
        tokio::spawn(run_backend(identity, Arc::new(EchoService), ui_tx, cmd_rx));
        (cmd_tx, ui_rx)
    }

    async fn next_event(rx: &mut mpsc::Receiver<UiEvent>) -> UiEvent {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for backend")
            .expect("backend closed")
    }

    #[tokio::test]
    async fn test_exchange_result_is_sent_back() {
        let (cmd_tx, mut ui_rx) = spawn_backend();
        let mut engine = ConversationEngine::default();
        let request = engine.send_user_message("hi", None).unwrap();

        cmd_tx
            .send(BackendCommand::Exchange {
                endpoint: engine.endpoint().to_string(),
                request,
            })
            .await
            .unwrap();

        let UiEvent::ExchangeCompleted(result) = next_event(&mut ui_rx).await else {
            panic!("Expected ExchangeCompleted");
        };
        engine.complete_exchange(result, None);
        assert_eq!(engine.messages()[1].text(), "echo: hi");
    }

    #[tokio::test]
    async fn test_probe_reports_its_endpoint() {
        let (cmd_tx, mut ui_rx) = spawn_backend();
        let engine = ConversationEngine::new("http://down.invalid");

        cmd_tx
            .send(BackendCommand::Probe {
                endpoint: engine.endpoint().to_string(),
                request: engine.probe_request(None),
            })
            .await
            .unwrap();

        let UiEvent::ProbeCompleted { endpoint, result } = next_event(&mut ui_rx).await else {
            panic!("Expected ProbeCompleted");
        };
        assert_eq!(endpoint, "http://down.invalid");
        assert!(result.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn test_sign_in_without_provider_reports_error() {
        let (cmd_tx, mut ui_rx) = spawn_backend();

        cmd_tx
            .send(BackendCommand::RequestOtp {
                email: "ana@example.com".into(),
            })
            .await
            .unwrap();

        let UiEvent::OtpRequested(result) = next_event(&mut ui_rx).await else {
            panic!("Expected OtpRequested");
        };
        assert!(result.is_err());
    }
}
