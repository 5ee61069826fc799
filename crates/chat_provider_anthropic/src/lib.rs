//! Anthropic Messages-backed implementation of the shared `chat_provider` contract.
//!
//! This adapter applies the strict normalization (system folding and role
//! alternation), maps the shared options onto the Messages request, and turns web
//! search citations into a trailing sources section.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anthropic_api::{
    AnthropicApiClient, AnthropicApiConfig, AnthropicApiError, EventStream, MessageParam,
    MessagesRequest, MessagesResponse, MessagesStreamEvent, ThinkingConfig, WebCitation,
    WebSearchTool,
};
use async_trait::async_trait;
use chat_provider::normalize::{alternating_turns, Turn, TurnRole};
use chat_provider::{
    forward_fragment, format_sources_section, ChatMessage, ChatOptions, ChatProvider, Citation,
    CitationDeduplicator, FragmentSender, ProviderError, SamplingParam,
};
use futures_util::StreamExt;
use tracing::{debug, warn};

/// Stable provider identifier used for startup selection.
pub const ANTHROPIC_PROVIDER_ID: &str = "anthropic";
/// Output token cap sent with every request unless overridden.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Beta enabling the extended context window on supported models.
pub const CONTEXT_1M_BETA: &str = "context-1m-2025-08-07";

const DEFAULT_MODEL_IDS: &[&str] = &[
    "claude-3-7-sonnet-latest",
    "claude-3-7-sonnet-20250219",
    "claude-3-5-haiku-latest",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-latest",
    "claude-3-opus-20240229",
    "claude-3-haiku-20240307",
    "claude-opus-4-20250514",
    "claude-sonnet-4-20250514",
    "claude-opus-4-1-20250805",
    "claude-sonnet-4-5",
    "claude-sonnet-4-5-20250929",
    "claude-opus-4-5-20251101",
    "claude-opus-4-5",
    "claude-haiku-4-5",
    "claude-haiku-4-5-20251001",
];

const CONTEXT_1M_MODELS: &[&str] = &[
    "claude-sonnet-4-20250514",
    "claude-sonnet-4-5",
    "claude-sonnet-4-5-20250929",
];

/// Runtime configuration for the Anthropic provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnthropicProviderConfig {
    pub api_key: String,
    pub model_ids: Vec<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub max_tokens: u32,
    /// Beta features requested per model. Requests retry once without them.
    pub model_betas: BTreeMap<String, Vec<String>>,
}

impl AnthropicProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model_ids: Vec<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_ids,
            base_url: None,
            timeout: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            model_betas: default_model_betas(),
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

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Replaces the per-model beta table.
    #[must_use]
    pub fn with_model_betas(mut self, model_betas: BTreeMap<String, Vec<String>>) -> Self {
        self.model_betas = model_betas;
        self
    }

    fn into_api_config(self) -> AnthropicApiConfig {
        let mut config = AnthropicApiConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

/// Beta table applied when the configuration does not provide one.
#[must_use]
pub fn default_model_betas() -> BTreeMap<String, Vec<String>> {
    CONTEXT_1M_MODELS
        .iter()
        .map(|model| (model.to_string(), vec![CONTEXT_1M_BETA.to_string()]))
        .collect()
}

#[async_trait]
trait MessagesTransport: Send + Sync {
    async fn create(
        &self,
        request: &MessagesRequest,
        betas: &[String],
    ) -> Result<MessagesResponse, AnthropicApiError>;

    async fn open_stream(
        &self,
        request: &MessagesRequest,
        betas: &[String],
    ) -> Result<EventStream, AnthropicApiError>;
}

#[derive(Debug)]
struct DefaultTransport {
    client: AnthropicApiClient,
}

#[async_trait]
impl MessagesTransport for DefaultTransport {
    async fn create(
        &self,
        request: &MessagesRequest,
        betas: &[String],
    ) -> Result<MessagesResponse, AnthropicApiError> {
        self.client.create_message(request, betas).await
    }

    async fn open_stream(
        &self,
        request: &MessagesRequest,
        betas: &[String],
    ) -> Result<EventStream, AnthropicApiError> {
        self.client.open_stream(request, betas).await
    }
}

/// `ChatProvider` adapter backed by `anthropic_api` transport primitives.
pub struct AnthropicProvider {
    model_ids: Vec<String>,
    max_tokens: u32,
    model_betas: BTreeMap<String, Vec<String>>,
    transport: Arc<dyn MessagesTransport>,
}

impl AnthropicProvider {
    /// Creates a provider using the real Messages API transport.
    pub fn new(config: AnthropicProviderConfig) -> Result<Self, ProviderError> {
        let model_ids = sanitize_model_ids(config.model_ids.clone());
        let max_tokens = config.max_tokens.max(1);
        let model_betas = config.model_betas.clone();
        let transport = Arc::new(DefaultTransport {
            client: AnthropicApiClient::new(config.into_api_config()).map_err(map_init_error)?,
        });

        Ok(Self {
            model_ids,
            max_tokens,
            model_betas,
            transport,
        })
    }

    fn resolve_model(&self, options: &ChatOptions) -> String {
        let requested = options.model.trim();
        if requested.is_empty() {
            self.model_ids[0].clone()
        } else {
            requested.to_string()
        }
    }

    fn betas_for(&self, model: &str) -> Vec<String> {
        self.model_betas.get(model).cloned().unwrap_or_default()
    }

    fn build_request(&self, turns: Vec<Turn>, options: &ChatOptions) -> MessagesRequest {
        let messages = turns
            .into_iter()
            .map(|turn| match turn.role {
                TurnRole::User => MessageParam::user(turn.text),
                TurnRole::Assistant => MessageParam::assistant(turn.text),
            })
            .collect();

        let mut request =
            MessagesRequest::new(self.resolve_model(options), self.max_tokens, messages);

        match options.sampling() {
            SamplingParam::Temperature(value) => request.temperature = Some(value),
            SamplingParam::TopP(value) => request.top_p = Some(value),
        }

        request.thinking = options.thinking.map(|level| match level.budget_tokens() {
            Some(budget_tokens) => ThinkingConfig::Enabled { budget_tokens },
            None => ThinkingConfig::Disabled,
        });

        if options.search {
            request.tools = vec![WebSearchTool::new(options.search_location.clone())];
        }

        request
    }

    async fn create_with_beta_fallback(
        &self,
        request: &MessagesRequest,
    ) -> Result<MessagesResponse, AnthropicApiError> {
        let betas = self.betas_for(&request.model);
        if betas.is_empty() {
            return self.transport.create(request, &[]).await;
        }

        match self.transport.create(request, &betas).await {
            Ok(response) => Ok(response),
            Err(error) => {
                warn!(
                    model = %request.model,
                    betas = %betas.join(","),
                    %error,
                    "beta request failed; retrying without beta features"
                );
                self.transport.create(request, &[]).await
            }
        }
    }

    async fn open_stream_with_beta_fallback(
        &self,
        request: &MessagesRequest,
    ) -> Result<EventStream, AnthropicApiError> {
        let betas = self.betas_for(&request.model);
        if betas.is_empty() {
            return self.transport.open_stream(request, &[]).await;
        }

        match self.transport.open_stream(request, &betas).await {
            Ok(stream) => Ok(stream),
            Err(error) => {
                warn!(
                    model = %request.model,
                    betas = %betas.join(","),
                    %error,
                    "beta stream failed; retrying without beta features"
                );
                self.transport.open_stream(request, &[]).await
            }
        }
    }

    #[cfg(test)]
    fn with_transport_for_tests(
        model_ids: Vec<String>,
        transport: Arc<dyn MessagesTransport>,
    ) -> Self {
        Self {
            model_ids: sanitize_model_ids(model_ids),
            max_tokens: DEFAULT_MAX_TOKENS,
            model_betas: default_model_betas(),
            transport,
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn provider_id(&self) -> &str {
        ANTHROPIC_PROVIDER_ID
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.model_ids.clone())
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let turns = alternating_turns(messages);
        if turns.is_empty() {
            debug!("no turns left after normalization; returning empty response");
            return Ok(String::new());
        }

        let request = self.build_request(turns, options);
        let response = self
            .create_with_beta_fallback(&request)
            .await
            .map_err(map_api_error)?;

        let mut dedup = CitationDeduplicator::new();
        let lines: Vec<String> = response
            .web_citations()
            .iter()
            .filter_map(|citation| dedup.add_and_format(&to_citation(citation)))
            .collect();

        let mut text = response.text();
        text.push_str(&format_sources_section(&lines));
        Ok(text)
    }

    async fn send_stream(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        out: FragmentSender,
    ) -> Result<(), ProviderError> {
        let turns = alternating_turns(messages);
        if turns.is_empty() {
            debug!("no turns left after normalization; closing stream");
            return Ok(());
        }

        let request = self.build_request(turns, options);
        let mut events = self
            .open_stream_with_beta_fallback(&request)
            .await
            .map_err(map_api_error)?;

        let mut dedup = CitationDeduplicator::new();
        let mut lines = Vec::new();
        while let Some(event) = events.next().await {
            match event.map_err(map_api_error)? {
                MessagesStreamEvent::TextDelta { text, .. } if !text.is_empty() => {
                    if !forward_fragment(&out, text).await {
                        debug!("stream consumer went away; stopping forwarding");
                        return Ok(());
                    }
                }
                MessagesStreamEvent::CitationDelta { citation, .. } => {
                    if let Some(line) = dedup.add_and_format(&to_citation(&citation)) {
                        lines.push(line);
                    }
                }
                _ => {}
            }
        }

        let sources = format_sources_section(&lines);
        if !sources.is_empty() {
            forward_fragment(&out, sources).await;
        }

        Ok(())
    }
}

fn to_citation(citation: &WebCitation) -> Citation {
    Citation {
        url: citation.url.clone(),
        title: citation.title.clone(),
        cited_text: citation.cited_text.clone(),
    }
}

fn sanitize_model_ids(model_ids: Vec<String>) -> Vec<String> {
    let mut sanitized: Vec<String> = model_ids
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();

    if sanitized.is_empty() {
        sanitized = DEFAULT_MODEL_IDS.iter().map(|id| id.to_string()).collect();
    }

    sanitized
}

fn map_init_error(error: AnthropicApiError) -> ProviderError {
    ProviderError::Init(format!("failed to initialize anthropic provider: {error}"))
}

fn map_api_error(error: AnthropicApiError) -> ProviderError {
    match error {
        AnthropicApiError::Status(status, message) => ProviderError::Status {
            status: status.as_u16(),
            message,
        },
        AnthropicApiError::StreamFailed { .. } => ProviderError::Stream(error.to_string()),
        other => ProviderError::Request(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard};

    use anthropic_api::response::{TextCitation, WEB_SEARCH_CITATION_TYPE};
    use anthropic_api::{ContentBlock, StatusCode};
    use chat_provider::ThinkingLevel;
    use futures_util::stream;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;

    enum FakeOutcome {
        Create(Result<MessagesResponse, AnthropicApiError>),
        Stream(Result<Vec<Result<MessagesStreamEvent, AnthropicApiError>>, AnthropicApiError>),
    }

    #[derive(Debug, Clone)]
    struct ObservedCall {
        request: MessagesRequest,
        betas: Vec<String>,
    }

    struct FakeTransport {
        observed: Mutex<Vec<ObservedCall>>,
        outcomes: Mutex<VecDeque<FakeOutcome>>,
    }

    impl FakeTransport {
        fn new(outcomes: Vec<FakeOutcome>) -> Arc<Self> {
            Arc::new(Self {
                observed: Mutex::new(Vec::new()),
                outcomes: Mutex::new(outcomes.into()),
            })
        }

        fn observed(&self) -> Vec<ObservedCall> {
            lock(&self.observed).clone()
        }

        fn record(&self, request: &MessagesRequest, betas: &[String]) -> FakeOutcome {
            lock(&self.observed).push(ObservedCall {
                request: request.clone(),
                betas: betas.to_vec(),
            });
            lock(&self.outcomes)
                .pop_front()
                .expect("fake outcome should be scripted for every call")
        }
    }

    #[async_trait]
    impl MessagesTransport for FakeTransport {
        async fn create(
            &self,
            request: &MessagesRequest,
            betas: &[String],
        ) -> Result<MessagesResponse, AnthropicApiError> {
            match self.record(request, betas) {
                FakeOutcome::Create(result) => result,
                FakeOutcome::Stream(_) => panic!("expected a create outcome"),
            }
        }

        async fn open_stream(
            &self,
            request: &MessagesRequest,
            betas: &[String],
        ) -> Result<EventStream, AnthropicApiError> {
            match self.record(request, betas) {
                FakeOutcome::Stream(result) => result.map(|events| stream::iter(events).boxed()),
                FakeOutcome::Create(_) => panic!("expected a stream outcome"),
            }
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().expect("fake transport lock")
    }

    fn text_response(blocks: Vec<ContentBlock>) -> MessagesResponse {
        MessagesResponse {
            id: "msg_1".to_string(),
            model: "claude".to_string(),
            content: blocks,
            stop_reason: Some("end_turn".to_string()),
        }
    }

    fn text_block(text: &str) -> ContentBlock {
        ContentBlock::Text {
            text: text.to_string(),
            citations: Vec::new(),
        }
    }

    fn web_citation(url: &str, title: &str, cited: Option<&str>) -> WebCitation {
        WebCitation {
            url: url.to_string(),
            title: title.to_string(),
            cited_text: cited.map(ToString::to_string),
        }
    }

    fn delta(text: &str) -> Result<MessagesStreamEvent, AnthropicApiError> {
        Ok(MessagesStreamEvent::TextDelta {
            index: 0,
            text: text.to_string(),
        })
    }

    fn provider(transport: Arc<FakeTransport>) -> AnthropicProvider {
        AnthropicProvider::with_transport_for_tests(vec!["claude-test".to_string()], transport)
    }

    async fn collect_stream(
        provider: &AnthropicProvider,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> (Vec<String>, Result<(), ProviderError>) {
        let (tx, mut rx) = mpsc::channel(32);
        let result = provider.send_stream(messages, options, tx).await;
        let mut fragments = Vec::new();
        while let Some(fragment) = rx.recv().await {
            fragments.push(fragment);
        }
        (fragments, result)
    }

    #[tokio::test]
    async fn send_folds_system_and_uses_temperature_by_default() {
        let transport = FakeTransport::new(vec![FakeOutcome::Create(Ok(text_response(vec![
            text_block("Hello "),
            text_block("there"),
        ])))]);
        let provider = provider(transport.clone());

        let text = provider
            .send(
                &[ChatMessage::system("be brief"), ChatMessage::user("hi")],
                &ChatOptions::default(),
            )
            .await
            .expect("send");
        assert_eq!(text, "Hello there");

        let observed = transport.observed();
        assert_eq!(observed.len(), 1);
        let request = &observed[0].request;
        assert_eq!(request.model, "claude-test");
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(request.messages, vec![MessageParam::user("be brief\n\nhi")]);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.top_p, None);
        assert!(request.thinking.is_none());
        assert!(request.tools.is_empty());
        assert!(observed[0].betas.is_empty());
    }

    #[tokio::test]
    async fn request_maps_top_p_thinking_and_search() {
        let transport =
            FakeTransport::new(vec![FakeOutcome::Create(Ok(text_response(Vec::new())))]);
        let provider = provider(transport.clone());
        let options = ChatOptions {
            model: "claude-haiku-4-5".to_string(),
            top_p: 0.3,
            thinking: Some(ThinkingLevel::High),
            search: true,
            search_location: Some("America/New_York".to_string()),
            ..ChatOptions::default()
        };

        provider
            .send(&[ChatMessage::user("q")], &options)
            .await
            .expect("send");

        let request = &transport.observed()[0].request;
        assert_eq!(request.model, "claude-haiku-4-5");
        assert_eq!(request.top_p, Some(0.3));
        assert_eq!(request.temperature, None);
        assert_eq!(
            request.thinking,
            Some(ThinkingConfig::Enabled {
                budget_tokens: 4096
            })
        );
        assert_eq!(
            request.tools,
            vec![WebSearchTool::new(Some("America/New_York".to_string()))]
        );
    }

    #[tokio::test]
    async fn thinking_off_is_sent_as_disabled() {
        let transport =
            FakeTransport::new(vec![FakeOutcome::Create(Ok(text_response(Vec::new())))]);
        let provider = provider(transport.clone());
        let options = ChatOptions {
            thinking: Some(ThinkingLevel::Off),
            ..ChatOptions::default()
        };

        provider
            .send(&[ChatMessage::user("q")], &options)
            .await
            .expect("send");
        assert_eq!(
            transport.observed()[0].request.thinking,
            Some(ThinkingConfig::Disabled)
        );
    }

    #[tokio::test]
    async fn send_appends_deduplicated_sources() {
        let cite = |url: &str, title: &str, cited: Option<&str>| TextCitation {
            kind: WEB_SEARCH_CITATION_TYPE.to_string(),
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            cited_text: cited.map(ToString::to_string),
        };
        let response = text_response(vec![
            ContentBlock::Text {
                text: "Fact one. ".to_string(),
                citations: vec![cite("https://a.test", "A", Some("q1"))],
            },
            ContentBlock::Text {
                text: "Fact two.".to_string(),
                citations: vec![
                    cite("https://a.test", "A", Some("q2")),
                    cite("https://b.test", "B", None),
                ],
            },
        ]);
        let transport = FakeTransport::new(vec![FakeOutcome::Create(Ok(response))]);
        let provider = provider(transport);

        let text = provider
            .send(&[ChatMessage::user("q")], &ChatOptions::default())
            .await
            .expect("send");
        assert_eq!(
            text,
            "Fact one. Fact two.\n\n## Sources\n\n- [A](https://a.test) - \"q1\"\n- [B](https://b.test)"
        );
    }

    #[tokio::test]
    async fn beta_models_fall_back_without_betas_on_failure() {
        let transport = FakeTransport::new(vec![
            FakeOutcome::Create(Err(AnthropicApiError::Status(
                StatusCode::BAD_REQUEST,
                "unknown beta".to_string(),
            ))),
            FakeOutcome::Create(Ok(text_response(vec![text_block("ok")]))),
        ]);
        let provider = provider(transport.clone());

        let text = provider
            .send(
                &[ChatMessage::user("q")],
                &ChatOptions::default().with_model("claude-sonnet-4-5"),
            )
            .await
            .expect("fallback should succeed");
        assert_eq!(text, "ok");

        let observed = transport.observed();
        assert_eq!(observed.len(), 2);
        assert_eq!(observed[0].betas, vec![CONTEXT_1M_BETA.to_string()]);
        assert!(observed[1].betas.is_empty());
    }

    #[tokio::test]
    async fn non_beta_failure_maps_status_without_retry() {
        let transport = FakeTransport::new(vec![FakeOutcome::Create(Err(
            AnthropicApiError::Status(StatusCode::TOO_MANY_REQUESTS, "slow down".to_string()),
        ))]);
        let provider = provider(transport.clone());

        let error = provider
            .send(&[ChatMessage::user("q")], &ChatOptions::default())
            .await
            .expect_err("send should fail");
        assert_eq!(
            error,
            ProviderError::Status {
                status: 429,
                message: "slow down".to_string(),
            }
        );
        assert_eq!(transport.observed().len(), 1);
    }

    #[tokio::test]
    async fn empty_normalized_conversation_skips_transport() {
        let transport = FakeTransport::new(Vec::new());
        let provider = provider(transport.clone());
        let messages = [ChatMessage::meta("m"), ChatMessage::user("  ")];

        let text = provider
            .send(&messages, &ChatOptions::default())
            .await
            .expect("send");
        assert_eq!(text, "");

        let (fragments, result) =
            collect_stream(&provider, &messages, &ChatOptions::default()).await;
        assert!(fragments.is_empty());
        assert_eq!(result, Ok(()));
        assert!(transport.observed().is_empty());
    }

    #[tokio::test]
    async fn stream_forwards_text_and_ends_with_sources() {
        let events = vec![
            Ok(MessagesStreamEvent::MessageStart {
                id: None,
                model: None,
            }),
            Ok(MessagesStreamEvent::ThinkingDelta {
                index: 0,
                thinking: "hidden".to_string(),
            }),
            delta("Hel"),
            delta(""),
            Ok(MessagesStreamEvent::CitationDelta {
                index: 1,
                citation: web_citation("https://a.test", "A", None),
            }),
            delta("lo"),
            Ok(MessagesStreamEvent::CitationDelta {
                index: 1,
                citation: web_citation("https://a.test", "A", Some("again")),
            }),
            Ok(MessagesStreamEvent::MessageStop),
        ];
        let transport = FakeTransport::new(vec![FakeOutcome::Stream(Ok(events))]);
        let provider = provider(transport);

        let (fragments, result) =
            collect_stream(&provider, &[ChatMessage::user("q")], &ChatOptions::default()).await;
        assert_eq!(result, Ok(()));
        assert_eq!(
            fragments,
            vec![
                "Hel".to_string(),
                "lo".to_string(),
                "\n\n## Sources\n\n- [A](https://a.test)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn stream_error_mid_way_is_surfaced_after_partial_output() {
        let events = vec![
            delta("partial"),
            Err(AnthropicApiError::StreamFailed {
                error_type: Some("overloaded_error".to_string()),
                message: "Overloaded".to_string(),
            }),
        ];
        let transport = FakeTransport::new(vec![FakeOutcome::Stream(Ok(events))]);
        let provider = provider(transport);

        let (fragments, result) =
            collect_stream(&provider, &[ChatMessage::user("q")], &ChatOptions::default()).await;
        assert_eq!(fragments, vec!["partial".to_string()]);
        assert!(matches!(result, Err(ProviderError::Stream(message)) if message.contains("Overloaded")));
    }

    #[tokio::test]
    async fn stream_beta_fallback_reopens_without_betas() {
        let transport = FakeTransport::new(vec![
            FakeOutcome::Stream(Err(AnthropicApiError::Status(
                StatusCode::BAD_REQUEST,
                "beta".to_string(),
            ))),
            FakeOutcome::Stream(Ok(vec![delta("ok")])),
        ]);
        let provider = provider(transport.clone());

        let (fragments, result) = collect_stream(
            &provider,
            &[ChatMessage::user("q")],
            &ChatOptions::default().with_model("claude-sonnet-4-20250514"),
        )
        .await;
        assert_eq!(result, Ok(()));
        assert_eq!(fragments, vec!["ok".to_string()]);
        assert_eq!(transport.observed().len(), 2);
    }

    #[tokio::test]
    async fn list_models_falls_back_to_defaults() {
        let provider =
            AnthropicProvider::with_transport_for_tests(Vec::new(), FakeTransport::new(Vec::new()));
        let models = provider.list_models().await.expect("models");
        assert_eq!(models[0], DEFAULT_MODEL_IDS[0]);
        assert!(!provider.needs_raw_mode(&models[0]));
        assert_eq!(provider.provider_id(), ANTHROPIC_PROVIDER_ID);
    }

    #[tokio::test]
    async fn blank_model_config_uses_the_full_default_list() {
        let provider = AnthropicProvider::with_transport_for_tests(
            vec!["  ".to_string(), String::new()],
            FakeTransport::new(Vec::new()),
        );
        let models = provider.list_models().await.expect("models");

        assert_eq!(models.len(), DEFAULT_MODEL_IDS.len());
        for id in [
            "claude-3-7-sonnet-latest",
            "claude-3-5-haiku-latest",
            "claude-3-opus-latest",
            "claude-3-haiku-20240307",
            "claude-opus-4-5-20251101",
            "claude-haiku-4-5-20251001",
        ] {
            assert!(models.iter().any(|model| model == id), "missing {id}");
        }
    }

    #[test]
    fn default_betas_cover_context_1m_models_only() {
        let betas = default_model_betas();
        assert_eq!(betas.len(), CONTEXT_1M_MODELS.len());
        assert_eq!(
            betas.get("claude-sonnet-4-5"),
            Some(&vec![CONTEXT_1M_BETA.to_string()])
        );
        assert!(betas.get("claude-haiku-4-5").is_none());
    }
}
