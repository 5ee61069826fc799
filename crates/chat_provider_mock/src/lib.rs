//! Deterministic mock implementation of the shared `chat_provider` contract.
//!
//! This crate contains no transport/protocol logic and is intended for local
//! development and contract-level integration testing.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chat_provider::normalize::permissive_messages;
use chat_provider::{
    forward_fragment, ChatMessage, ChatOptions, ChatProvider, FragmentSender, ProviderError,
};
use tracing::debug;

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// One exchange as observed by the mock, after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExchange {
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
    pub streamed: bool,
}

/// Deterministic mock provider used by orchestrator tests and local runs.
#[derive(Debug)]
pub struct MockProvider {
    chunks: Vec<String>,
    model_ids: Vec<String>,
    raw_mode_models: Vec<String>,
    failure: Option<ProviderError>,
    stream_failure: Option<(usize, ProviderError)>,
    token_delay: Duration,
    exchanges: Mutex<Vec<RecordedExchange>>,
}

impl MockProvider {
    /// Creates a mock provider that answers every exchange with `chunks`.
    #[must_use]
    pub fn new(chunks: Vec<String>) -> Self {
        Self::with_models(chunks, vec!["mock".to_string(), "mock-alt".to_string()])
    }

    /// Creates a mock provider with an explicit model list.
    #[must_use]
    pub fn with_models(chunks: Vec<String>, model_ids: Vec<String>) -> Self {
        Self {
            chunks,
            model_ids: sanitize_model_ids(model_ids),
            raw_mode_models: Vec::new(),
            failure: None,
            stream_failure: None,
            token_delay: Duration::ZERO,
            exchanges: Mutex::new(Vec::new()),
        }
    }

    /// Marks `models` as unable to take a separate system message.
    #[must_use]
    pub fn with_raw_mode_models(mut self, models: Vec<String>) -> Self {
        self.raw_mode_models = models
            .into_iter()
            .map(|model| model.trim().to_string())
            .filter(|model| !model.is_empty())
            .collect();
        self
    }

    /// Fails every exchange before any fragment is produced.
    #[must_use]
    pub fn with_failure(mut self, error: ProviderError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Fails a streaming exchange after `fragments` fragments were forwarded.
    #[must_use]
    pub fn with_stream_failure_after(mut self, fragments: usize, error: ProviderError) -> Self {
        self.stream_failure = Some((fragments, error));
        self
    }

    /// Sleeps between streamed tokens.
    #[must_use]
    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }

    /// Returns every exchange received so far, oldest first.
    #[must_use]
    pub fn exchanges(&self) -> Vec<RecordedExchange> {
        lock_unpoisoned(&self.exchanges).clone()
    }

    /// Returns the most recent exchange.
    #[must_use]
    pub fn last_exchange(&self) -> Option<RecordedExchange> {
        lock_unpoisoned(&self.exchanges).last().cloned()
    }

    fn record(&self, messages: &[ChatMessage], options: &ChatOptions, streamed: bool) {
        let messages = permissive_messages(messages);
        debug!(
            messages = messages.len(),
            model = %options.model,
            streamed,
            "mock provider received exchange"
        );
        lock_unpoisoned(&self.exchanges).push(RecordedExchange {
            messages,
            options: options.clone(),
            streamed,
        });
    }

    fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        for chunk in &self.chunks {
            let mut pending_token = String::new();
            for ch in chunk.chars() {
                pending_token.push(ch);
                if matches!(ch, ' ' | '\n') {
                    tokens.push(std::mem::take(&mut pending_token));
                }
            }
            if !pending_token.is_empty() {
                tokens.push(pending_token);
            }
        }
        tokens
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(vec![
            "# Mock response\n".to_string(),
            "This reply comes from the **mock** provider and is deterministic.\n".to_string(),
            "\n".to_string(),
            "- It streams token by token.\n".to_string(),
            "- It never touches the network.\n".to_string(),
            "Completed successfully.\n".to_string(),
        ])
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn provider_id(&self) -> &str {
        MOCK_PROVIDER_ID
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.model_ids.clone())
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        self.record(messages, options, false);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self.chunks.concat())
    }

    async fn send_stream(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        out: FragmentSender,
    ) -> Result<(), ProviderError> {
        self.record(messages, options, true);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let tokens = self.tokens();
        let total = tokens.len();
        for (index, token) in tokens.into_iter().enumerate() {
            if let Some((after, error)) = &self.stream_failure {
                if index == *after {
                    return Err(error.clone());
                }
            }

            if !forward_fragment(&out, token).await {
                debug!("mock stream consumer went away");
                return Ok(());
            }

            if !self.token_delay.is_zero() {
                tokio::time::sleep(self.token_delay).await;
            }
        }

        match &self.stream_failure {
            Some((after, error)) if *after >= total => Err(error.clone()),
            _ => Ok(()),
        }
    }

    fn needs_raw_mode(&self, model: &str) -> bool {
        self.raw_mode_models.iter().any(|candidate| candidate == model)
    }
}

fn sanitize_model_ids(model_ids: Vec<String>) -> Vec<String> {
    let mut sanitized: Vec<String> = model_ids
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();

    if sanitized.is_empty() {
        sanitized.push("mock".to_string());
    }

    sanitized
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
