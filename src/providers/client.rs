use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::core::error::ChatError;
use crate::providers::wire::{ChatCompletionRequest, ChatCompletionResponse, ErrorResponse, WireMessage};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Sampling parameters for one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct SendOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// The outbound seam between the orchestrator and the gateway, so sends
/// can be stubbed out in tests.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(
        &self,
        messages: &[WireMessage],
        model: &str,
        api_key: &str,
        base_url: &str,
        options: SendOptions,
    ) -> Result<String, ChatError>;
}

/// HTTP client for the chat-completions gateway. One attempt per call,
/// no retries, platform-default timeout.
pub struct GatewayClient {
    client: Client,
    referrer: String,
    app_title: String,
}

impl GatewayClient {
    pub fn new() -> Self {
        Self::with_identity("https://github.com/sparkchat", "Sparkchat")
    }

    /// Identification headers are non-functional metadata some gateways
    /// use for attribution.
    pub fn with_identity(referrer: impl Into<String>, app_title: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            referrer: referrer.into(),
            app_title: app_title.into(),
        }
    }
}

impl Default for GatewayClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dispatcher for GatewayClient {
    async fn send(
        &self,
        messages: &[WireMessage],
        model: &str,
        api_key: &str,
        base_url: &str,
        options: SendOptions,
    ) -> Result<String, ChatError> {
        let payload = ChatCompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        debug!(model, url = %url, "dispatching chat completion");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.referrer)
            .header("X-Title", &self.app_title)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .map(|detail| detail.message)
                .unwrap_or(status_text);
            return Err(ChatError::ProviderApi(message));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            ChatError::MalformedResponse(format!("could not parse response body: {}", e))
        })?;

        let reply = body
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                ChatError::MalformedResponse("response contained no choices".to_string())
            })?;

        Ok(reply)
    }
}
