use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chat_provider::{ChatOptions, ChatProvider};
use prompt_store::{ChatStorage, StrategyLoader};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chatter::Chatter;
use crate::dispatcher::FRAGMENT_BUFFER;
use crate::error::ChatError;
use crate::events::ChatEvent;
use crate::registry::ProviderRegistry;
use crate::request::ChatRequest;

/// Context length a batch chatter starts from when options carry none.
pub const DEFAULT_MODEL_CONTEXT_LENGTH: usize = 2048;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptRequest {
    pub user_input: String,
    pub vendor: String,
    pub model: String,
    pub context_name: String,
    pub pattern_name: String,
    pub strategy_name: String,
    pub session_name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl PromptRequest {
    fn to_chat_request(&self, language: Option<&str>) -> ChatRequest {
        let mut request = ChatRequest::new(self.user_input.clone());
        request.session_name = Some(self.session_name.clone());
        request.context_name = Some(self.context_name.clone());
        request.pattern_name = Some(self.pattern_name.clone());
        request.strategy_name = Some(self.strategy_name.clone());
        request.pattern_variables = self.variables.clone();
        request.language = language.map(str::to_owned);
        request
    }
}

/// Ordered prompts sharing one language and one set of options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptBatch {
    #[serde(default)]
    pub prompts: Vec<PromptRequest>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(flatten)]
    pub options: ChatOptions,
}

/// Runs prompt batches and reports each prompt as content, error, and complete
/// events.
pub struct ChatService {
    registry: ProviderRegistry,
    storage: Arc<dyn ChatStorage>,
    strategies: Arc<dyn StrategyLoader>,
    stream: bool,
    project_root: Option<PathBuf>,
}

impl ChatService {
    #[must_use]
    pub fn new(
        registry: ProviderRegistry,
        storage: Arc<dyn ChatStorage>,
        strategies: Arc<dyn StrategyLoader>,
    ) -> Self {
        Self {
            registry,
            storage,
            strategies,
            stream: false,
            project_root: None,
        }
    }

    /// Streams fragments as separate content events instead of one final event.
    #[must_use]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Processes the prompts strictly in order.
    ///
    /// Stops with [`ChatError::Cancelled`] once `cancel` fires or the `events`
    /// receiver is dropped, before the next prompt or in the middle of a stream.
    pub async fn run_prompts(
        &self,
        batch: PromptBatch,
        events: mpsc::Sender<ChatEvent>,
        cancel: CancellationToken,
    ) -> Result<(), ChatError> {
        info!(
            prompts = batch.prompts.len(),
            language = batch.language.as_deref().unwrap_or(""),
            "received prompt batch"
        );

        for (index, prompt) in batch.prompts.iter().enumerate() {
            if cancel.is_cancelled() || events.is_closed() {
                info!(prompt = index + 1, "consumer gone; stopping batch");
                return Err(ChatError::Cancelled);
            }

            info!(
                prompt = index + 1,
                provider = %prompt.vendor,
                model = %prompt.model,
                pattern = %prompt.pattern_name,
                context = %prompt.context_name,
                "processing prompt"
            );
            self.run_prompt(prompt, &batch, &events, &cancel).await?;
            send_event(&events, ChatEvent::complete()).await?;
        }
        Ok(())
    }

    async fn run_prompt(
        &self,
        prompt: &PromptRequest,
        batch: &PromptBatch,
        events: &mpsc::Sender<ChatEvent>,
        cancel: &CancellationToken,
    ) -> Result<(), ChatError> {
        let outcome = match self.chatter_for(prompt, &batch.options).await {
            Ok(chatter) => self.send(&chatter, prompt, batch, events, cancel).await,
            Err(error) => Err(error),
        };

        match outcome {
            Ok(Some(content)) => send_event(events, ChatEvent::content(content)).await,
            Ok(None) => Ok(()),
            Err(ChatError::Cancelled) => Err(ChatError::Cancelled),
            Err(error) => {
                warn!(%error, "prompt failed");
                send_event(events, ChatEvent::error(&error)).await
            }
        }
    }

    /// Returns the final content to emit, or `None` when it already went out as
    /// live fragments. A streamed reply rewritten after the stream ended, such as
    /// a file-edit summary, is returned for emission.
    async fn send(
        &self,
        chatter: &Chatter,
        prompt: &PromptRequest,
        batch: &PromptBatch,
        events: &mpsc::Sender<ChatEvent>,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, ChatError> {
        let request = prompt.to_chat_request(batch.language.as_deref());
        let live_stream = self.stream && !batch.options.suppress_think;

        if !live_stream {
            let session = chatter.send(&request, &batch.options, None, cancel).await?;
            return Ok(session.last_message().map(|message| message.content.clone()));
        }

        let (live, mut fragments) = mpsc::channel::<String>(FRAGMENT_BUFFER);
        let forward = async move {
            let mut streamed = String::new();
            while let Some(fragment) = fragments.recv().await {
                streamed.push_str(&fragment);
                if events.send(ChatEvent::content(fragment)).await.is_err() {
                    break;
                }
            }
            streamed
        };
        let (session, streamed) = tokio::join!(
            chatter.send(&request, &batch.options, Some(live), cancel),
            forward
        );
        let session = session?;

        Ok(session
            .last_message()
            .map(|message| &message.content)
            .filter(|content| **content != streamed)
            .cloned())
    }

    async fn chatter_for(
        &self,
        prompt: &PromptRequest,
        options: &ChatOptions,
    ) -> Result<Chatter, ChatError> {
        let provider = self
            .registry
            .resolve(&prompt.vendor)
            .ok_or_else(|| ChatError::UnknownProvider(prompt.vendor.clone()))?;
        let model = resolve_model(provider.as_ref(), &prompt.model, &options.model).await?;

        let mut chatter = Chatter::new(
            provider,
            Arc::clone(&self.storage),
            Arc::clone(&self.strategies),
            model,
        )
        .with_stream(self.stream)
        .with_model_context_length(DEFAULT_MODEL_CONTEXT_LENGTH);
        if let Some(root) = &self.project_root {
            chatter = chatter.with_project_root(root.clone());
        }
        Ok(chatter)
    }
}

/// Prompt model, else batch model, else the provider's first listed model.
async fn resolve_model(
    provider: &dyn ChatProvider,
    prompt_model: &str,
    batch_model: &str,
) -> Result<String, ChatError> {
    for candidate in [prompt_model, batch_model] {
        if !candidate.trim().is_empty() {
            return Ok(candidate.trim().to_owned());
        }
    }
    let models = provider.list_models().await?;
    Ok(models.into_iter().next().unwrap_or_default())
}

async fn send_event(events: &mpsc::Sender<ChatEvent>, event: ChatEvent) -> Result<(), ChatError> {
    events.send(event).await.map_err(|_| ChatError::Cancelled)
}
