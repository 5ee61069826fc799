use std::collections::BTreeMap;

use chat_provider::ChatMessage;
use serde::{Deserialize, Serialize};

/// One chat request: names of stored artifacts plus the live user message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRequest {
    pub session_name: Option<String>,
    pub context_name: Option<String>,
    pub pattern_name: Option<String>,
    pub strategy_name: Option<String>,
    pub message: Option<ChatMessage>,
    /// Auxiliary text recorded as a `meta` message and never sent to a provider.
    pub meta: Option<String>,
    pub pattern_variables: BTreeMap<String, String>,
    pub language: Option<String>,
    /// The user message itself contains `{{name}}` placeholders to substitute.
    pub input_has_vars: bool,
    pub no_variable_replacement: bool,
}

impl ChatRequest {
    /// Request carrying a plain user message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(ChatMessage::user(message)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.message = Some(message);
        self
    }

    #[must_use]
    pub fn with_session(mut self, name: impl Into<String>) -> Self {
        self.session_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, name: impl Into<String>) -> Self {
        self.context_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, name: impl Into<String>) -> Self {
        self.pattern_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pattern_variables.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_input_vars(mut self) -> Self {
        self.input_has_vars = true;
        self
    }

    #[must_use]
    pub fn without_variable_replacement(mut self) -> Self {
        self.no_variable_replacement = true;
        self
    }

    pub fn session(&self) -> Option<&str> {
        non_empty(&self.session_name)
    }

    pub fn context(&self) -> Option<&str> {
        non_empty(&self.context_name)
    }

    pub fn pattern(&self) -> Option<&str> {
        non_empty(&self.pattern_name)
    }

    pub fn strategy(&self) -> Option<&str> {
        non_empty(&self.strategy_name)
    }

    pub fn meta_text(&self) -> Option<&str> {
        non_empty(&self.meta)
    }

    pub fn language_name(&self) -> Option<&str> {
        non_empty(&self.language)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use chat_provider::ChatMessage;
    use pretty_assertions::assert_eq;

    use super::ChatRequest;

    #[test]
    fn blank_names_read_as_absent() {
        let request = ChatRequest::new("hi")
            .with_session("  ")
            .with_pattern("summarize");
        assert_eq!(request.session(), None);
        assert_eq!(request.pattern(), Some("summarize"));
        assert_eq!(request.context(), None);
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"patternName":"p","message":{"role":"user","content":"x"},"patternVariables":{"a":"1"}}"#,
        )
        .expect("request json");
        assert_eq!(request.pattern(), Some("p"));
        assert_eq!(request.message, Some(ChatMessage::user("x")));
        assert_eq!(request.pattern_variables.get("a").map(String::as_str), Some("1"));
        assert!(!request.input_has_vars);
    }
}
