use crate::response::WebCitation;

/// Stream event emitted by the parser after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagesStreamEvent {
    MessageStart {
        id: Option<String>,
        model: Option<String>,
    },
    ContentBlockStart {
        index: usize,
        block_type: String,
    },
    TextDelta {
        index: usize,
        text: String,
    },
    ThinkingDelta {
        index: usize,
        thinking: String,
    },
    /// A web search citation attached to the text block at `index`.
    CitationDelta {
        index: usize,
        citation: WebCitation,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        stop_reason: Option<String>,
    },
    MessageStop,
    Ping,
    Error {
        error_type: Option<String>,
        message: Option<String>,
    },
    /// Unknown event type retained for passthrough.
    Unknown {
        event_type: String,
    },
}

impl MessagesStreamEvent {
    /// Text carried by a text delta.
    pub fn text_delta(&self) -> Option<&str> {
        match self {
            Self::TextDelta { text, .. } if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}
