use serde::{Deserialize, Serialize};

/// Citation type produced by the web search tool.
pub const WEB_SEARCH_CITATION_TYPE: &str = "web_search_result_location";

/// Aggregated response of a non-streaming Messages call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
        #[serde(default, deserialize_with = "null_as_empty")]
        citations: Vec<TextCitation>,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    /// Tool use, tool results and any block type this client does not read.
    #[serde(other)]
    Other,
}

/// Raw citation attached to a text block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCitation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cited_text: Option<String>,
}

impl TextCitation {
    /// Returns the web citation, or `None` for other citation kinds.
    pub fn as_web(&self) -> Option<WebCitation> {
        if self.kind != WEB_SEARCH_CITATION_TYPE {
            return None;
        }
        Some(WebCitation {
            url: self.url.clone().unwrap_or_default(),
            title: self.title.clone().unwrap_or_default(),
            cited_text: self.cited_text.clone().filter(|text| !text.is_empty()),
        })
    }
}

/// Web search citation reduced to the fields callers render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebCitation {
    pub url: String,
    pub title: String,
    pub cited_text: Option<String>,
}

impl MessagesResponse {
    /// Concatenated text of all non-empty text blocks, in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text, .. } if !text.is_empty() => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Web citations of all non-empty text blocks, in order, duplicates kept.
    pub fn web_citations(&self) -> Vec<WebCitation> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text, citations } if !text.is_empty() => Some(citations),
                _ => None,
            })
            .flatten()
            .filter_map(TextCitation::as_web)
            .collect()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<TextCitation>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<TextCitation>>::deserialize(deserializer)?.unwrap_or_default())
}
