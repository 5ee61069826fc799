use std::collections::VecDeque;

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use tracing::debug;

use crate::config::AnthropicApiConfig;
use crate::error::{parse_error_message, AnthropicApiError};
use crate::events::MessagesStreamEvent;
use crate::headers::build_headers;
use crate::payload::MessagesRequest;
use crate::response::MessagesResponse;
use crate::sse::SseStreamParser;
use crate::url::normalize_messages_url;

/// Ordered stream of normalized events. Ends after the first `Err`.
pub type EventStream = BoxStream<'static, Result<MessagesStreamEvent, AnthropicApiError>>;

#[derive(Debug)]
pub struct AnthropicApiClient {
    http: Client,
    config: AnthropicApiConfig,
}

impl AnthropicApiClient {
    pub fn new(config: AnthropicApiConfig) -> Result<Self, AnthropicApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(AnthropicApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AnthropicApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_messages_url(&self.config.base_url)
    }

    pub fn build_headers(
        &self,
        betas: &[String],
        stream: bool,
    ) -> Result<HeaderMap, AnthropicApiError> {
        let headers = build_headers(&self.config, betas, stream)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    AnthropicApiError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    AnthropicApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &MessagesRequest,
        betas: &[String],
        stream: bool,
    ) -> Result<reqwest::RequestBuilder, AnthropicApiError> {
        validate_request(request)?;

        let headers = self.build_headers(betas, stream)?;
        let mut payload = request.clone();
        payload.stream = stream;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(&payload))
    }

    /// Sends the request once and fails on any non-success status.
    pub async fn send_checked(
        &self,
        request: &MessagesRequest,
        betas: &[String],
        stream: bool,
    ) -> Result<Response, AnthropicApiError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            betas = betas.len(),
            stream,
            "sending messages request"
        );
        let response = self.build_request(request, betas, stream)?.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        Err(AnthropicApiError::Status(
            status,
            parse_error_message(status, &body),
        ))
    }

    /// Non-streaming call returning the aggregated message.
    pub async fn create_message(
        &self,
        request: &MessagesRequest,
        betas: &[String],
    ) -> Result<MessagesResponse, AnthropicApiError> {
        let response = self.send_checked(request, betas, false).await?;
        let body = response.text().await?;
        serde_json::from_str::<MessagesResponse>(&body)
            .map_err(|error| AnthropicApiError::MalformedResponse(error.to_string()))
    }

    /// Opens a streaming call. HTTP failures surface here, before any event.
    pub async fn open_stream(
        &self,
        request: &MessagesRequest,
        betas: &[String],
    ) -> Result<EventStream, AnthropicApiError> {
        let response = self.send_checked(request, betas, true).await?;
        Ok(event_stream(response))
    }
}

struct StreamState {
    bytes: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    parser: SseStreamParser,
    pending: VecDeque<MessagesStreamEvent>,
    finished: bool,
}

fn event_stream(response: Response) -> EventStream {
    let state = StreamState {
        bytes: response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed(),
        parser: SseStreamParser::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                if let Some(error) = stream_failure_from_event(&event) {
                    state.pending.clear();
                    state.finished = true;
                    return Some((Err(error), state));
                }
                return Some((Ok(event), state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.parser.feed(&chunk);
                    state.pending.extend(events);
                }
                Some(Err(error)) => {
                    state.finished = true;
                    return Some((Err(AnthropicApiError::from(error)), state));
                }
                None => {
                    state.finished = true;
                    let events = state.parser.finish();
                    state.pending.extend(events);
                }
            }
        }
    })
    .boxed()
}

fn validate_request(request: &MessagesRequest) -> Result<(), AnthropicApiError> {
    if request.model.trim().is_empty() {
        return Err(AnthropicApiError::Unknown("model is required".to_string()));
    }
    if request.messages.is_empty() {
        return Err(AnthropicApiError::Unknown(
            "at least one message is required".to_string(),
        ));
    }
    Ok(())
}

fn stream_failure_from_event(event: &MessagesStreamEvent) -> Option<AnthropicApiError> {
    match event {
        MessagesStreamEvent::Error {
            error_type,
            message,
        } => Some(AnthropicApiError::StreamFailed {
            error_type: error_type.clone(),
            message: message
                .clone()
                .or_else(|| error_type.clone())
                .unwrap_or_else(|| r#"{"type":"error"}"#.to_owned()),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{stream_failure_from_event, validate_request};
    use crate::events::MessagesStreamEvent;
    use crate::payload::{MessageParam, MessagesRequest};
    use crate::AnthropicApiError;

    #[test]
    fn error_events_become_stream_failures() {
        let event = MessagesStreamEvent::Error {
            error_type: Some("overloaded_error".to_owned()),
            message: Some("Overloaded".to_owned()),
        };
        let error = stream_failure_from_event(&event).expect("error event should fail");
        assert_eq!(error.to_string(), "stream failed (overloaded_error): Overloaded");
    }

    #[test]
    fn error_event_without_message_falls_back_to_type() {
        let event = MessagesStreamEvent::Error {
            error_type: Some("api_error".to_owned()),
            message: None,
        };
        assert!(matches!(
            stream_failure_from_event(&event),
            Some(AnthropicApiError::StreamFailed { message, .. }) if message == "api_error"
        ));
    }

    #[test]
    fn non_error_events_pass_through() {
        let event = MessagesStreamEvent::TextDelta {
            index: 0,
            text: "x".to_owned(),
        };
        assert!(stream_failure_from_event(&event).is_none());
    }

    #[test]
    fn validate_rejects_empty_model_and_messages() {
        let empty_model = MessagesRequest::new(" ", 16, vec![MessageParam::user("hi")]);
        assert!(validate_request(&empty_model).is_err());

        let no_messages = MessagesRequest::new("claude", 16, Vec::new());
        assert!(validate_request(&no_messages).is_err());

        let ok = MessagesRequest::new("claude", 16, vec![MessageParam::user("hi")]);
        assert!(validate_request(&ok).is_ok());
    }
}
