use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Heading of the section appended to search-augmented responses.
pub const SOURCES_HEADER: &str = "## Sources";

/// A source reference attached to a search-augmented response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_text: Option<String>,
}

impl Citation {
    #[must_use]
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            cited_text: None,
        }
    }

    #[must_use]
    pub fn with_cited_text(mut self, cited_text: impl Into<String>) -> Self {
        self.cited_text = Some(cited_text.into());
        self
    }
}

/// Renders one citation as a markdown list item.
#[must_use]
pub fn format_citation(citation: &Citation) -> String {
    let mut line = format!("- [{}]({})", citation.title, citation.url);
    if let Some(cited) = citation
        .cited_text
        .as_deref()
        .filter(|cited| !cited.is_empty())
    {
        line.push_str(&format!(" - \"{cited}\""));
    }
    line
}

/// Renders the trailing sources section, or an empty string without lines.
#[must_use]
pub fn format_sources_section(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    format!("\n\n{SOURCES_HEADER}\n\n{}", lines.join("\n"))
}

/// Tracks citations already seen, keyed by `(url, title)`.
#[derive(Debug, Default)]
pub struct CitationDeduplicator {
    seen: HashSet<(String, String)>,
}

impl CitationDeduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a `(url, title)` pair is added.
    pub fn add(&mut self, citation: &Citation) -> bool {
        self.seen
            .insert((citation.url.clone(), citation.title.clone()))
    }

    /// Returns the formatted line for a first occurrence, `None` for a repeat.
    pub fn add_and_format(&mut self, citation: &Citation) -> Option<String> {
        self.add(citation).then(|| format_citation(citation))
    }
}

/// Keeps the first occurrence of each `(url, title)` pair, preserving order.
#[must_use]
pub fn dedup_citations(citations: &[Citation]) -> Vec<Citation> {
    let mut dedup = CitationDeduplicator::new();
    citations
        .iter()
        .filter(|citation| dedup.add(citation))
        .cloned()
        .collect()
}
