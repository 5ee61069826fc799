use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chat_provider::ChatMessage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ArtifactKind, StoreError};
use crate::paths::PromptLayout;
use crate::session::Session;
use crate::template;

/// Stand-in for `{{input}}` while pattern variables are substituted, so a variable
/// value can never inject or consume the user input placeholder.
pub const INPUT_SENTINEL: &str = "__CHAT_ORCHESTRATOR_INPUT_SENTINEL__";

const INPUT_PLACEHOLDER: &str = "{{input}}";

/// Named artifacts a chat request can refer to.
pub trait ChatStorage: Send + Sync {
    /// Loads a stored session. Unknown names fail with [`StoreError::NotFound`].
    fn session(&self, name: &str) -> Result<Session, StoreError>;

    /// Persists a named session. Anonymous sessions are ignored.
    fn save_session(&self, session: &Session) -> Result<(), StoreError>;

    fn context(&self, name: &str) -> Result<String, StoreError>;

    /// Loads a pattern, substitutes `variables`, then places `input` at its
    /// `{{input}}` placeholder.
    fn pattern(
        &self,
        name: &str,
        variables: &BTreeMap<String, String>,
        input: &str,
    ) -> Result<String, StoreError>;

    /// Loads a pattern and places `input` without touching other placeholders.
    fn raw_pattern(&self, name: &str, input: &str) -> Result<String, StoreError>;
}

/// Named system prefix prepended to the assembled system message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prompt: String,
}

pub trait StrategyLoader: Send + Sync {
    fn strategy(&self, name: &str) -> Result<Strategy, StoreError>;
}

/// Store backed by one directory tree, see [`PromptLayout`].
#[derive(Debug, Clone)]
pub struct FsPromptStore {
    layout: PromptLayout,
}

impl FsPromptStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: PromptLayout::new(root),
        }
    }

    #[must_use]
    pub fn layout(&self) -> &PromptLayout {
        &self.layout
    }

    /// Saves an empty session under `name` unless one already exists.
    pub fn create_session(&self, name: &str) -> Result<Session, StoreError> {
        match self.session(name) {
            Ok(session) => Ok(session),
            Err(StoreError::NotFound { .. }) => {
                let session = Session::named(name);
                self.save_session(&session)?;
                Ok(session)
            }
            Err(error) => Err(error),
        }
    }

    pub fn save_context(&self, name: &str, content: &str) -> Result<(), StoreError> {
        write_file(&self.layout.context_path(name)?, content)
    }

    pub fn save_pattern(&self, name: &str, content: &str) -> Result<(), StoreError> {
        write_file(&self.layout.pattern_path(name)?, content)
    }

    pub fn save_strategy(&self, name: &str, strategy: &Strategy) -> Result<(), StoreError> {
        let path = self.layout.strategy_path(name)?;
        let body = serde_json::to_string_pretty(strategy)
            .map_err(|source| StoreError::json(&path, source))?;
        write_file(&path, &body)
    }

    fn read_pattern(&self, name: &str) -> Result<String, StoreError> {
        let path = self.layout.pattern_path(name)?;
        read_artifact(ArtifactKind::Pattern, name, &path)
    }
}

impl ChatStorage for FsPromptStore {
    fn session(&self, name: &str) -> Result<Session, StoreError> {
        let path = self.layout.session_path(name)?;
        let body = read_artifact(ArtifactKind::Session, name, &path)?;
        let messages = serde_json::from_str::<Vec<ChatMessage>>(&body)
            .map_err(|source| StoreError::json(&path, source))?;
        debug!(session = name, messages = messages.len(), "loaded session");
        Ok(Session::named(name).with_messages(messages))
    }

    fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        let Some(name) = session.name.as_deref().filter(|name| !name.is_empty()) else {
            return Ok(());
        };
        let path = self.layout.session_path(name)?;
        let body = serde_json::to_string_pretty(&session.messages)
            .map_err(|source| StoreError::json(&path, source))?;
        write_file(&path, &body)?;
        debug!(
            session = name,
            messages = session.messages.len(),
            "saved session"
        );
        Ok(())
    }

    fn context(&self, name: &str) -> Result<String, StoreError> {
        let path = self.layout.context_path(name)?;
        read_artifact(ArtifactKind::Context, name, &path)
    }

    fn pattern(
        &self,
        name: &str,
        variables: &BTreeMap<String, String>,
        input: &str,
    ) -> Result<String, StoreError> {
        let pattern = with_input_placeholder(self.read_pattern(name)?);
        let guarded = pattern.replace(INPUT_PLACEHOLDER, INPUT_SENTINEL);
        let substituted = template::apply(&guarded, variables)?;
        Ok(substituted.replace(INPUT_SENTINEL, input))
    }

    fn raw_pattern(&self, name: &str, input: &str) -> Result<String, StoreError> {
        let pattern = with_input_placeholder(self.read_pattern(name)?);
        Ok(pattern.replace(INPUT_PLACEHOLDER, input))
    }
}

impl StrategyLoader for FsPromptStore {
    fn strategy(&self, name: &str) -> Result<Strategy, StoreError> {
        let path = self.layout.strategy_path(name)?;
        let body = read_artifact(ArtifactKind::Strategy, name, &path)?;
        serde_json::from_str(&body).map_err(|source| StoreError::json(&path, source))
    }
}

fn with_input_placeholder(mut pattern: String) -> String {
    if !pattern.contains(INPUT_PLACEHOLDER) {
        if !pattern.is_empty() && !pattern.ends_with('\n') {
            pattern.push('\n');
        }
        pattern.push_str(INPUT_PLACEHOLDER);
    }
    pattern
}

fn read_artifact(kind: ArtifactKind, name: &str, path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            StoreError::not_found(kind, name)
        } else {
            StoreError::io("reading artifact", path, source)
        }
    })
}

fn write_file(path: &Path, body: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| StoreError::io("creating directory", parent, source))?;
    }
    fs::write(path, body).map_err(|source| StoreError::io("writing artifact", path, source))
}
