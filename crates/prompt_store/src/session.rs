use chat_provider::{ChatMessage, Role};

/// Ordered conversation plus an optional persistence name.
///
/// Anonymous sessions live only for one request; named sessions are loaded from
/// and saved back to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub name: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl Session {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            messages: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn is_named(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
    }

    #[must_use]
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Messages a provider receives. `meta` entries stay in the session only.
    #[must_use]
    pub fn vendor_messages(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|message| message.role != Role::Meta)
            .cloned()
            .collect()
    }
}
