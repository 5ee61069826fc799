//! Provider-neutral contract for a single chat exchange.
//!
//! This crate defines the canonical message model, the request options shared by
//! every backend, and the fixed capability set a backend exposes. It excludes
//! transport details, session assembly, and response post-processing.
//!
//! Backends differ in the structural rules they impose on a conversation. The
//! [`normalize`] module holds the per-provider transforms that adapt the canonical
//! message sequence to those rules.

use std::borrow::Cow;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

mod citations;
pub mod normalize;
mod options;

pub use citations::{
    dedup_citations, format_citation, format_sources_section, Citation, CitationDeduplicator,
    SOURCES_HEADER,
};
pub use options::{
    ChatOptions, SamplingParam, ThinkingLevel, DEFAULT_TEMPERATURE, DEFAULT_THINK_END_TAG,
    DEFAULT_THINK_START_TAG, DEFAULT_TOP_P,
};

/// Author of one message in the canonical sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Auxiliary request metadata. Never subject to role alternation and dropped by
    /// providers that have no equivalent.
    Meta,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Meta => "meta",
        }
    }
}

/// One typed part of a multi-part message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    ImageUrl {
        url: String,
    },
    File {
        name: String,
        mime_type: String,
        data: String,
    },
}

impl MessagePart {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// Canonical conversation message.
///
/// A message carries either plain `content` or an ordered `parts` list. When parts
/// are present they win: providers without multi-part support send the joined text
/// of the parts and ignore `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    #[must_use]
    pub fn meta(content: impl Into<String>) -> Self {
        Self::new(Role::Meta, content)
    }

    /// Creates a multi-part message. `content` stays empty.
    #[must_use]
    pub fn with_parts(role: Role, parts: Vec<MessagePart>) -> Self {
        Self {
            role,
            content: String::new(),
            parts,
        }
    }

    #[must_use]
    pub fn has_parts(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Returns the text a single-representation provider should send.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        if self.parts.is_empty() {
            return Cow::Borrowed(&self.content);
        }

        let joined = self
            .parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        Cow::Owned(joined)
    }
}

/// Error returned by a provider exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider initialization failed: {0}")]
    Init(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("stream failed: {0}")]
    Stream(String),
    #[error("{0} is not supported by this provider")]
    Unsupported(String),
    #[error("request was cancelled")]
    Cancelled,
}

/// Sending half of the fragment channel handed to [`ChatProvider::send_stream`].
pub type FragmentSender = mpsc::Sender<String>;

/// Capability set shared by every chat backend.
#[async_trait]
pub trait ChatProvider: Send + Sync + 'static {
    /// Stable identifier used for provider selection.
    fn provider_id(&self) -> &str;

    /// Lists the model identifiers this provider accepts.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;

    /// Performs one exchange and returns the aggregated response text.
    async fn send(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError>;

    /// Performs one exchange, writing each incremental fragment to `out` in emission
    /// order. The channel closes when `out` is dropped, which happens when this call
    /// returns.
    ///
    /// A send failure on `out` means the consumer went away; implementations stop
    /// forwarding and may let the underlying call run to completion.
    async fn send_stream(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        out: FragmentSender,
    ) -> Result<(), ProviderError>;

    /// Returns true when the model cannot take a separate system message and the
    /// caller must assemble the conversation in raw mode.
    fn needs_raw_mode(&self, _model: &str) -> bool {
        false
    }
}

/// Forwards one fragment. Returns false once the consumer has gone away.
pub async fn forward_fragment(out: &FragmentSender, fragment: impl Into<String>) -> bool {
    out.send(fragment.into()).await.is_ok()
}
