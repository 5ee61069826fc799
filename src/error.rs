use chat_provider::ProviderError;
use prompt_store::{ArtifactKind, StoreError, TemplateError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("could not find session {name}")]
    SessionNotFound { name: String },

    #[error("could not find context {name}")]
    ContextNotFound { name: String },

    #[error("could not get pattern {name}")]
    PatternNotFound { name: String },

    #[error("could not load strategy {name}")]
    StrategyNotFound { name: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("no session, pattern or user messages provided")]
    NoContent,

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("empty response from AI model")]
    EmptyResponse,

    #[error("storage failed: {0}")]
    Storage(#[source] StoreError),

    #[error("request was cancelled")]
    Cancelled,

    #[error("dispatch task failed: {0}")]
    TaskFailed(String),
}

impl ChatError {
    /// Maps a failed lookup of a named artifact.
    pub(crate) fn lookup(kind: ArtifactKind, name: &str, error: StoreError) -> Self {
        let name = name.to_owned();
        match error {
            StoreError::NotFound { .. } | StoreError::InvalidName { .. } => match kind {
                ArtifactKind::Session => Self::SessionNotFound { name },
                ArtifactKind::Context => Self::ContextNotFound { name },
                ArtifactKind::Pattern => Self::PatternNotFound { name },
                ArtifactKind::Strategy => Self::StrategyNotFound { name },
            },
            StoreError::Template(error) => Self::Template(error),
            other => Self::Storage(other),
        }
    }

    /// True for failures caused by a stored artifact that does not exist.
    #[must_use]
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound { .. }
                | Self::ContextNotFound { .. }
                | Self::PatternNotFound { .. }
                | Self::StrategyNotFound { .. }
        )
    }
}

impl From<StoreError> for ChatError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Template(error) => Self::Template(error),
            other => Self::Storage(other),
        }
    }
}
