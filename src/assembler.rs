//! Turns a [`ChatRequest`] plus stored artifacts into an ordered session.
//!
//! Two mutually exclusive modes exist. Normal mode keeps the assembled system
//! text as its own `system` message. Raw mode folds everything into a single
//! user message for models that cannot take a separate system prompt.

use chat_provider::{ChatMessage, MessagePart, Role};
use prompt_store::{template, ArtifactKind, ChatStorage, Session, StrategyLoader};
use tracing::debug;

use crate::error::ChatError;
use crate::request::ChatRequest;

/// Language that needs no explicit response-language instruction.
pub const DEFAULT_LANGUAGE: &str = "en";

pub struct SessionAssembler<'a> {
    storage: &'a dyn ChatStorage,
    strategies: &'a dyn StrategyLoader,
}

impl<'a> SessionAssembler<'a> {
    #[must_use]
    pub fn new(storage: &'a dyn ChatStorage, strategies: &'a dyn StrategyLoader) -> Self {
        Self {
            storage,
            strategies,
        }
    }

    /// Builds the session for `request`. Fails with [`ChatError::NoContent`] when
    /// nothing at all would be sent.
    pub fn build_session(&self, request: &ChatRequest, raw: bool) -> Result<Session, ChatError> {
        let mut session = self.load_or_create(request)?;

        if let Some(meta) = request.meta_text() {
            session.append(ChatMessage::meta(meta));
        }

        let context = self.context_content(request)?;
        let message = user_message(request)?;
        let pattern = self.pattern_content(request, &message)?;
        let system = self.system_message(request, &context, pattern.as_deref().unwrap_or(""))?;
        let input_used = pattern.is_some();

        if raw {
            populate_raw(&mut session, request, system, message);
        } else {
            populate_normal(&mut session, system, message, input_used);
        }

        if session.is_empty() {
            return Err(ChatError::NoContent);
        }
        debug!(
            session = session.name.as_deref().unwrap_or(""),
            messages = session.messages.len(),
            raw,
            "assembled session"
        );
        Ok(session)
    }

    fn load_or_create(&self, request: &ChatRequest) -> Result<Session, ChatError> {
        match request.session() {
            Some(name) => self
                .storage
                .session(name)
                .map_err(|error| ChatError::lookup(ArtifactKind::Session, name, error)),
            None => Ok(Session::anonymous()),
        }
    }

    fn context_content(&self, request: &ChatRequest) -> Result<String, ChatError> {
        match request.context() {
            Some(name) => self
                .storage
                .context(name)
                .map_err(|error| ChatError::lookup(ArtifactKind::Context, name, error)),
            None => Ok(String::new()),
        }
    }

    /// Pattern text with the user input placed, or `None` when no pattern is named.
    fn pattern_content(
        &self,
        request: &ChatRequest,
        message: &ChatMessage,
    ) -> Result<Option<String>, ChatError> {
        let Some(name) = request.pattern() else {
            return Ok(None);
        };

        let input = message.content.as_str();
        let loaded = if request.no_variable_replacement {
            self.storage.raw_pattern(name, input)
        } else {
            self.storage.pattern(name, &request.pattern_variables, input)
        };
        loaded
            .map(Some)
            .map_err(|error| ChatError::lookup(ArtifactKind::Pattern, name, error))
    }

    /// Context and pattern are trimmed and joined by a blank line rather than
    /// concatenated as stored. An enabled strategy prompt leads on its own line.
    /// A non-default language appends its instruction.
    fn system_message(
        &self,
        request: &ChatRequest,
        context: &str,
        pattern: &str,
    ) -> Result<String, ChatError> {
        let mut system = [context.trim(), pattern.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        if let Some(name) = request.strategy() {
            let strategy = self
                .strategies
                .strategy(name)
                .map_err(|error| ChatError::lookup(ArtifactKind::Strategy, name, error))?;
            if !strategy.prompt.is_empty() {
                system = format!("{}\n{system}", strategy.prompt);
            }
        }

        if let Some(language) = request
            .language_name()
            .filter(|language| *language != DEFAULT_LANGUAGE)
        {
            system = format!(
                "{system}\n\nIMPORTANT: First, execute the instructions provided in this prompt using the user's input. Second, ensure your entire final response, including any section headers or titles generated as part of executing the instructions, is written ONLY in the {language} language."
            );
        }

        Ok(system)
    }
}

/// The request's user message after optional variable substitution. A missing
/// message reads as an empty user message.
fn user_message(request: &ChatRequest) -> Result<ChatMessage, ChatError> {
    let mut message = request
        .message
        .clone()
        .unwrap_or_else(|| ChatMessage::user(""));

    if request.input_has_vars && !request.no_variable_replacement {
        message.content = template::apply(&message.content, &request.pattern_variables)?;
    }
    Ok(message)
}

fn is_blank(message: &ChatMessage) -> bool {
    !message.has_parts() && message.content.trim().is_empty()
}

fn populate_raw(
    session: &mut Session,
    request: &ChatRequest,
    system: String,
    message: ChatMessage,
) {
    if system.is_empty() {
        if !is_blank(&message) {
            session.append(message);
        }
        return;
    }

    // a named pattern already carries the input
    let content = if request.pattern().is_some() || message.content.trim().is_empty() {
        system
    } else {
        format!("{system}\n\n{}", message.content)
    };

    let message = if message.has_parts() {
        let mut parts = vec![MessagePart::text(content)];
        parts.extend(message.parts.into_iter().filter(|part| !part.is_text()));
        ChatMessage::with_parts(Role::User, parts)
    } else {
        ChatMessage::user(content)
    };
    session.append(message);
}

fn populate_normal(session: &mut Session, system: String, message: ChatMessage, input_used: bool) {
    if !system.is_empty() {
        session.append(ChatMessage::system(system));
    }

    let keep = message.has_parts() || !input_used;
    if keep && !is_blank(&message) {
        session.append(message);
    }
}
