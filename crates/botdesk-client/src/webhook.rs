//! Rasa REST channel client.
//!
//! `POST {endpoint}/webhooks/rest/webhook` with `{sender, message, metadata?}`
//! answers with a JSON array of `{recipient_id, text, buttons?}` entries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use botdesk_core::QuickReply;

use crate::error::ClientError;

/// Path of the REST channel under the configured endpoint.
pub const WEBHOOK_PATH: &str = "/webhooks/rest/webhook";

/// Build the full webhook URL for an endpoint.
pub fn webhook_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim().trim_end_matches('/'), WEBHOOK_PATH)
}

/// Shorten a token for log output.
pub fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(12).collect();
    format!("{}...", prefix)
}

/// Credential block carried in-band, since some deployments never hand
/// HTTP headers through to the dialogue service's actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestMetadata {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<Map<String, Value>>,
    #[serde(rename = "Authorization")]
    pub authorization: String,
}

/// JSON body of a webhook call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub sender: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RequestMetadata>,
}

/// A webhook call ready to be sent: body plus optional bearer header.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueRequest {
    pub payload: WebhookPayload,
    pub bearer_token: Option<String>,
}

/// One reply entry from the dialogue service.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WebhookReply {
    #[serde(default)]
    pub recipient_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub buttons: Option<Vec<QuickReply>>,
}

impl WebhookReply {
    /// Create a text-only reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Attach quick-reply buttons.
    pub fn with_buttons(mut self, buttons: Vec<QuickReply>) -> Self {
        self.buttons = Some(buttons);
        self
    }
}

/// Remote dialogue-management service.
#[async_trait]
pub trait DialogueService: Send + Sync {
    /// Send one request and return the service's reply entries.
    async fn exchange(
        &self,
        endpoint: &str,
        request: &DialogueRequest,
    ) -> Result<Vec<WebhookReply>, ClientError>;
}

/// HTTP client for the Rasa REST channel.
pub struct RasaClient {
    inner: reqwest::Client,
}

impl RasaClient {
    /// Create a new client.
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }
}

impl Default for RasaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DialogueService for RasaClient {
    async fn exchange(
        &self,
        endpoint: &str,
        request: &DialogueRequest,
    ) -> Result<Vec<WebhookReply>, ClientError> {
        let url = webhook_url(endpoint);
        debug!(url = %url, sender = %request.payload.sender, "POST webhook");

        let mut builder = self.inner.post(&url).json(&request.payload);
        if let Some(token) = &request.bearer_token {
            debug!(token = %token_preview(token), "Attaching bearer token");
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(status = status.as_u16(), "Webhook returned error status");
            return Err(ClientError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode {
            message: e.to_string(),
            body,
        })
    }
}
