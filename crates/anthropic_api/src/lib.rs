//! Transport-only Anthropic Messages API client primitives.
//!
//! This crate owns request building, response parsing and SSE normalization for
//! the `/v1/messages` endpoint only. It contains no conversation shaping; callers
//! hand it an already alternating list of user/assistant turns.
//!
//! Streaming responses are exposed as an ordered [`EventStream`] of
//! [`MessagesStreamEvent`] values. Server-side `error` events terminate the stream
//! with [`AnthropicApiError::StreamFailed`].

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod response;
pub mod sse;
pub mod url;

pub use client::{AnthropicApiClient, EventStream};
pub use config::AnthropicApiConfig;
pub use error::AnthropicApiError;
pub use events::MessagesStreamEvent;
pub use payload::{MessageParam, MessageRole, MessagesRequest, ThinkingConfig, WebSearchTool};
pub use response::{ContentBlock, MessagesResponse, WebCitation};
pub use reqwest::StatusCode;
pub use sse::SseStreamParser;
pub use url::normalize_messages_url;
