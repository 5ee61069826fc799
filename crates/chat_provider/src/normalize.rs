//! Per-provider adaptation of the canonical message sequence.
//!
//! [`alternating_turns`] serves the strictest provider class: system text is folded
//! into the first user turn and user/assistant turns strictly alternate.
//! [`permissive_messages`] serves providers that accept free-form role sequences.

use tracing::debug;

use crate::{ChatMessage, Role};

/// Assistant turn inserted between two consecutive user turns.
pub const FILLER_ASSISTANT_TEXT: &str = "Okay.";
/// User turn inserted between two consecutive assistant turns.
pub const FILLER_USER_TEXT: &str = "Hi";

const SYSTEM_JOIN: &str = "\n";
const SYSTEM_PREFIX_JOIN: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

/// One emitted turn of a strictly alternating conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Alternation {
    pending_system: String,
    system_consumed: bool,
    last_was_user: bool,
    turns: Vec<Turn>,
}

impl Alternation {
    fn on_system(&mut self, text: &str) {
        if self.system_consumed {
            debug!("dropping system message received after system text was consumed");
            return;
        }

        if !self.pending_system.is_empty() {
            self.pending_system.push_str(SYSTEM_JOIN);
        }
        self.pending_system.push_str(text);
    }

    fn take_system(&mut self) -> Option<String> {
        if self.system_consumed || self.pending_system.is_empty() {
            return None;
        }

        self.system_consumed = true;
        Some(std::mem::take(&mut self.pending_system))
    }

    fn on_user(&mut self, text: &str) {
        let text = match self.take_system() {
            Some(system) => format!("{system}{SYSTEM_PREFIX_JOIN}{text}"),
            None => text.to_string(),
        };
        self.push_user(text);
    }

    fn on_assistant(&mut self, text: &str) {
        if let Some(system) = self.take_system() {
            self.push_user(system);
        } else if !self.last_was_user && !self.turns.is_empty() {
            self.push_user(FILLER_USER_TEXT.to_string());
        }

        self.turns.push(Turn::assistant(text));
        self.last_was_user = false;
    }

    fn push_user(&mut self, text: String) {
        if self.last_was_user {
            self.turns.push(Turn::assistant(FILLER_ASSISTANT_TEXT));
        }
        self.turns.push(Turn::user(text));
        self.last_was_user = true;
    }

    fn finish(mut self) -> Vec<Turn> {
        if self.turns.is_empty() && !self.pending_system.is_empty() {
            self.turns.push(Turn::user(self.pending_system));
        }
        self.turns
    }
}

/// Folds system text into user turns and enforces user/assistant alternation.
///
/// - System messages accumulate as pending text, prepended to the first user turn
///   or emitted as a synthetic user turn ahead of an assistant turn.
/// - Consecutive turns of the same role get a minimal filler turn in between.
/// - Messages whose text is blank are skipped; roles other than system, user and
///   assistant are dropped.
/// - A system-only conversation yields a single user turn.
#[must_use]
pub fn alternating_turns(messages: &[ChatMessage]) -> Vec<Turn> {
    let mut state = Alternation::default();

    for message in messages {
        let text = message.text();
        if text.trim().is_empty() {
            continue;
        }

        match message.role {
            Role::System => state.on_system(&text),
            Role::User => state.on_user(&text),
            Role::Assistant => state.on_assistant(&text),
            Role::Meta => debug!(role = message.role.as_str(), "dropping unsupported role"),
        }
    }

    state.finish()
}

/// Keeps system, user and assistant messages in order, dropping blank messages and
/// `meta`. Multi-part messages keep only their parts.
#[must_use]
pub fn permissive_messages(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter(|message| message.role != Role::Meta)
        .filter(|message| !message.text().trim().is_empty())
        .map(|message| {
            let mut message = message.clone();
            if message.has_parts() {
                message.content.clear();
            }
            message
        })
        .collect()
}
