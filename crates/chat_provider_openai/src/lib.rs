//! OpenAI-compatible Chat Completions implementation of the shared `chat_provider`
//! contract.
//!
//! This adapter applies the permissive normalization: system, user and assistant
//! messages pass through in order with their roles, and multi-part messages are
//! sent as typed content parts. It also serves any server speaking the same wire
//! format through a custom base URL.

pub mod client;
pub mod error;
pub mod sse;
pub mod wire;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat_provider::normalize::permissive_messages;
use chat_provider::{
    forward_fragment, ChatMessage, ChatOptions, ChatProvider, FragmentSender, MessagePart,
    ProviderError, SamplingParam, ThinkingLevel,
};
use futures_util::StreamExt;
use serde_json::json;
use tracing::debug;

pub use client::{
    endpoint_url, OpenAiClient, OpenAiClientConfig, TextStream, DEFAULT_OPENAI_BASE_URL,
};
pub use error::OpenAiError;
pub use wire::{
    parse_models, CompletionRequest, CompletionResponse, FileData, ImageUrl, WireContent,
    WireMessage, WirePart,
};

/// Stable provider identifier used for startup selection.
pub const OPENAI_PROVIDER_ID: &str = "openai";

const DEFAULT_MODEL_ID: &str = "gpt-4o";

/// Runtime configuration for the OpenAI-compatible provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiProviderConfig {
    pub api_key: String,
    /// Advertised models. Empty means "ask the server".
    pub model_ids: Vec<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl OpenAiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model_ids: Vec<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_ids,
            base_url: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_client_config(self) -> OpenAiClientConfig {
        let mut config = OpenAiClientConfig::new(self.api_key);
        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }
}

#[async_trait]
trait CompletionsTransport: Send + Sync {
    async fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResponse, OpenAiError>;

    async fn open_stream(&self, request: &CompletionRequest) -> Result<TextStream, OpenAiError>;

    async fn list_models(&self) -> Result<Vec<String>, OpenAiError>;
}

#[derive(Debug)]
struct DefaultTransport {
    client: OpenAiClient,
}

#[async_trait]
impl CompletionsTransport for DefaultTransport {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, OpenAiError> {
        self.client.complete(request).await
    }

    async fn open_stream(&self, request: &CompletionRequest) -> Result<TextStream, OpenAiError> {
        self.client.open_stream(request).await
    }

    async fn list_models(&self) -> Result<Vec<String>, OpenAiError> {
        self.client.list_models().await
    }
}

/// `ChatProvider` adapter for OpenAI-compatible endpoints.
pub struct OpenAiProvider {
    model_ids: Vec<String>,
    transport: Arc<dyn CompletionsTransport>,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderError> {
        let model_ids = sanitize_model_ids(config.model_ids.clone());
        let client = OpenAiClient::new(config.into_client_config()).map_err(|error| {
            ProviderError::Init(format!("failed to initialize openai provider: {error}"))
        })?;
        Ok(Self {
            model_ids,
            transport: Arc::new(DefaultTransport { client }),
        })
    }

    fn resolve_model(&self, options: &ChatOptions) -> String {
        match options.model.trim() {
            "" => self
                .model_ids
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            requested => requested.to_string(),
        }
    }

    fn build_request(
        &self,
        messages: Vec<WireMessage>,
        options: &ChatOptions,
    ) -> CompletionRequest {
        let mut request = CompletionRequest::new(self.resolve_model(options), messages);

        match options.sampling() {
            SamplingParam::Temperature(value) => request.temperature = Some(value),
            SamplingParam::TopP(value) => request.top_p = Some(value),
        }
        if options.frequency_penalty != 0.0 {
            request.frequency_penalty = Some(options.frequency_penalty);
        }
        if options.presence_penalty != 0.0 {
            request.presence_penalty = Some(options.presence_penalty);
        }

        request.reasoning_effort = options.thinking.and_then(reasoning_effort);

        if options.search {
            request.web_search_options = Some(match &options.search_location {
                Some(timezone) => json!({
                    "user_location": {
                        "type": "approximate",
                        "approximate": { "timezone": timezone }
                    }
                }),
                None => json!({}),
            });
        }

        request
    }

    #[cfg(test)]
    fn with_transport_for_tests(
        model_ids: Vec<String>,
        transport: Arc<dyn CompletionsTransport>,
    ) -> Self {
        Self {
            model_ids: sanitize_model_ids(model_ids),
            transport,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn provider_id(&self) -> &str {
        OPENAI_PROVIDER_ID
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        if !self.model_ids.is_empty() {
            return Ok(self.model_ids.clone());
        }
        self.transport.list_models().await.map_err(map_api_error)
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let messages = wire_messages(messages);
        if messages.is_empty() {
            debug!("no messages left after normalization; returning empty response");
            return Ok(String::new());
        }

        let request = self.build_request(messages, options);
        let response = self
            .transport
            .complete(&request)
            .await
            .map_err(map_api_error)?;
        Ok(response.text())
    }

    async fn send_stream(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        out: FragmentSender,
    ) -> Result<(), ProviderError> {
        let messages = wire_messages(messages);
        if messages.is_empty() {
            debug!("no messages left after normalization; closing stream");
            return Ok(());
        }

        let request = self.build_request(messages, options);
        let mut deltas = self
            .transport
            .open_stream(&request)
            .await
            .map_err(map_api_error)?;

        while let Some(delta) = deltas.next().await {
            let text = delta.map_err(map_api_error)?;
            if !forward_fragment(&out, text).await {
                debug!("stream consumer went away; stopping forwarding");
                return Ok(());
            }
        }
        Ok(())
    }
}

fn wire_messages(messages: &[ChatMessage]) -> Vec<WireMessage> {
    permissive_messages(messages)
        .into_iter()
        .map(|message| WireMessage {
            role: message.role.as_str().to_string(),
            content: if message.has_parts() {
                WireContent::Parts(message.parts.into_iter().map(wire_part).collect())
            } else {
                WireContent::Text(message.content)
            },
        })
        .collect()
}

fn wire_part(part: MessagePart) -> WirePart {
    match part {
        MessagePart::Text { text } => WirePart::Text { text },
        MessagePart::ImageUrl { url } => WirePart::ImageUrl {
            image_url: ImageUrl { url },
        },
        MessagePart::File {
            name,
            mime_type,
            data,
        } => WirePart::File {
            file: FileData {
                filename: name,
                file_data: format!("data:{mime_type};base64,{data}"),
            },
        },
    }
}

fn reasoning_effort(level: ThinkingLevel) -> Option<String> {
    match level {
        ThinkingLevel::Low => Some("low".to_string()),
        ThinkingLevel::Medium => Some("medium".to_string()),
        ThinkingLevel::High => Some("high".to_string()),
        ThinkingLevel::Off | ThinkingLevel::Budget(_) => None,
    }
}

fn sanitize_model_ids(model_ids: Vec<String>) -> Vec<String> {
    model_ids
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn map_api_error(error: OpenAiError) -> ProviderError {
    match error {
        OpenAiError::Status { status, message } => ProviderError::Status { status, message },
        OpenAiError::StreamFailed(_) => ProviderError::Stream(error.to_string()),
        other => ProviderError::Request(other.to_string()),
    }
}
