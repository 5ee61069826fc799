//! Events produced for a front end, one stream per prompt batch.

use serde::{Deserialize, Serialize};

/// Leading keywords of the diagram languages rendered as mermaid.
pub const MERMAID_PREFIXES: [&str; 6] = [
    "graph TD",
    "gantt",
    "flowchart",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Content,
    Error,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Markdown,
    Mermaid,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub format: ContentFormat,
    pub content: String,
}

impl ChatEvent {
    /// Content event, classified by [`detect_format`].
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            kind: EventKind::Content,
            format: detect_format(&content),
            content,
        }
    }

    #[must_use]
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            kind: EventKind::Error,
            format: ContentFormat::Plain,
            content: format!("Error: {message}"),
        }
    }

    #[must_use]
    pub fn complete() -> Self {
        Self {
            kind: EventKind::Complete,
            format: ContentFormat::Plain,
            content: String::new(),
        }
    }

    /// Serializes the event as one SSE frame: `data: {json}\n\n`.
    pub fn to_sse_frame(&self) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

#[must_use]
pub fn detect_format(content: &str) -> ContentFormat {
    if MERMAID_PREFIXES
        .iter()
        .any(|prefix| content.starts_with(prefix))
    {
        ContentFormat::Mermaid
    } else {
        ContentFormat::Markdown
    }
}
