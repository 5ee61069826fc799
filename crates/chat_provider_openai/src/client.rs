use std::collections::VecDeque;
use std::time::Duration;

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::error::{error_message, parse_error_message, OpenAiError};
use crate::sse::{SseFrame, SseParser};
use crate::wire::{parse_models, CompletionChunk, CompletionRequest, CompletionResponse};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Streamed text deltas. Ends after the first `Err`.
pub type TextStream = BoxStream<'static, Result<String, OpenAiError>>;

/// Transport configuration for an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiClientConfig {
    pub api_key: String,
    /// Base URL up to and including the version segment, e.g. `.../v1`.
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl OpenAiClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Joins `path` onto the base URL, defaulting an empty base.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    let base = match base_url.trim() {
        "" => DEFAULT_OPENAI_BASE_URL,
        trimmed => trimmed,
    };
    format!("{}/{path}", base.trim_end_matches('/'))
}

#[derive(Debug)]
pub struct OpenAiClient {
    http: Client,
    config: OpenAiClientConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, OpenAiError> {
        if config.api_key.trim().is_empty() {
            return Err(OpenAiError::MissingApiKey);
        }
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    fn authorized(&self, builder: RequestBuilder, accept: &str) -> RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key.trim()))
            .header(ACCEPT, accept)
    }

    async fn post_checked(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<Response, OpenAiError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            stream,
            "sending chat completion request"
        );
        let mut payload = request.clone();
        payload.stream = stream;
        let accept = if stream {
            "text/event-stream"
        } else {
            "application/json"
        };
        let builder = self
            .http
            .post(endpoint_url(&self.config.base_url, "chat/completions"))
            .json(&payload);
        check_status(self.authorized(builder, accept).send().await?).await
    }

    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, OpenAiError> {
        let body = self.post_checked(request, false).await?.text().await?;
        serde_json::from_str(&body)
            .map_err(|error| OpenAiError::MalformedResponse(error.to_string()))
    }

    /// Opens a streaming completion. HTTP failures surface here, before any delta.
    pub async fn open_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<TextStream, OpenAiError> {
        let response = self.post_checked(request, true).await?;
        Ok(text_stream(response))
    }

    pub async fn list_models(&self) -> Result<Vec<String>, OpenAiError> {
        let builder = self.http.get(endpoint_url(&self.config.base_url, "models"));
        let response = self.authorized(builder, "application/json").send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        parse_models(&body).ok_or_else(|| {
            let preview: String = body.chars().take(500).collect();
            OpenAiError::MalformedResponse(format!("unable to parse models response: {preview}"))
        })
    }
}

async fn check_status(response: Response) -> Result<Response, OpenAiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(OpenAiError::Status {
        status: status.as_u16(),
        message: parse_error_message(status, &body),
    })
}

struct StreamState {
    bytes: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    parser: SseParser,
    pending: VecDeque<SseFrame>,
    finished: bool,
}

fn text_stream(response: Response) -> TextStream {
    let state = StreamState {
        bytes: response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed(),
        parser: SseParser::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.pending.pop_front() {
                match frame_text(frame) {
                    FrameOutcome::Text(text) => return Some((Ok(text), state)),
                    FrameOutcome::Skip => continue,
                    FrameOutcome::Done => {
                        state.pending.clear();
                        state.finished = true;
                        continue;
                    }
                    FrameOutcome::Failed(error) => {
                        state.pending.clear();
                        state.finished = true;
                        return Some((Err(error), state));
                    }
                }
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let frames = state.parser.feed(&chunk);
                    state.pending.extend(frames);
                }
                Some(Err(error)) => {
                    state.finished = true;
                    return Some((Err(OpenAiError::from(error)), state));
                }
                None => {
                    state.finished = true;
                    state.pending.extend(state.parser.finish());
                }
            }
        }
    })
    .boxed()
}

enum FrameOutcome {
    Text(String),
    Skip,
    Done,
    Failed(OpenAiError),
}

fn frame_text(frame: SseFrame) -> FrameOutcome {
    let payload = match frame {
        SseFrame::Done => return FrameOutcome::Done,
        SseFrame::Data(payload) => payload,
    };
    let Ok(value) = serde_json::from_str::<Value>(&payload) else {
        return FrameOutcome::Skip;
    };
    if let Some(message) = error_message(&value) {
        return FrameOutcome::Failed(OpenAiError::StreamFailed(message));
    }
    match serde_json::from_value::<CompletionChunk>(value) {
        Ok(chunk) => match chunk.text() {
            Some(text) => FrameOutcome::Text(text.to_string()),
            None => FrameOutcome::Skip,
        },
        Err(_) => FrameOutcome::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_paths() {
        assert_eq!(
            endpoint_url("https://api.openai.com/v1/", "models"),
            "https://api.openai.com/v1/models"
        );
        assert_eq!(
            endpoint_url("  ", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint_url("http://localhost:11434/v1", "chat/completions"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn client_requires_api_key() {
        assert!(matches!(
            OpenAiClient::new(OpenAiClientConfig::new(" ")),
            Err(OpenAiError::MissingApiKey)
        ));
    }

    #[test]
    fn error_frames_fail_the_stream() {
        let outcome = frame_text(SseFrame::Data(
            r#"{"error":{"message":"overloaded","type":"server_error"}}"#.to_string(),
        ));
        assert!(matches!(
            outcome,
            FrameOutcome::Failed(OpenAiError::StreamFailed(message)) if message == "server_error: overloaded"
        ));
    }

    #[test]
    fn content_and_done_frames() {
        assert!(matches!(
            frame_text(SseFrame::Data(r#"{"choices":[{"delta":{"content":"hi"}}]}"#.to_string())),
            FrameOutcome::Text(text) if text == "hi"
        ));
        assert!(matches!(
            frame_text(SseFrame::Data(r#"{"choices":[]}"#.to_string())),
            FrameOutcome::Skip
        ));
        assert!(matches!(frame_text(SseFrame::Done), FrameOutcome::Done));
    }
}
