use std::path::{Path, PathBuf};

use crate::error::{ArtifactKind, StoreError};

pub const SESSIONS_DIR: &str = "sessions";
pub const CONTEXTS_DIR: &str = "contexts";
pub const PATTERNS_DIR: &str = "patterns";
pub const STRATEGIES_DIR: &str = "strategies";
pub const PATTERN_FILE: &str = "system.md";

/// Directory layout under a store root.
///
/// ```text
/// <root>/sessions/<name>.json
/// <root>/contexts/<name>
/// <root>/patterns/<name>/system.md
/// <root>/strategies/<name>.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLayout {
    root: PathBuf,
}

impl PromptLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(ArtifactKind::Session, name)?;
        Ok(self.root.join(SESSIONS_DIR).join(format!("{name}.json")))
    }

    pub fn context_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(ArtifactKind::Context, name)?;
        Ok(self.root.join(CONTEXTS_DIR).join(name))
    }

    pub fn pattern_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(ArtifactKind::Pattern, name)?;
        Ok(self.root.join(PATTERNS_DIR).join(name).join(PATTERN_FILE))
    }

    pub fn strategy_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(ArtifactKind::Strategy, name)?;
        Ok(self.root.join(STRATEGIES_DIR).join(format!("{name}.json")))
    }
}

/// Rejects names that are empty or could leave their artifact directory.
pub fn validate_name(kind: ArtifactKind, name: &str) -> Result<(), StoreError> {
    let invalid = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        return Err(StoreError::InvalidName {
            kind,
            name: name.to_owned(),
        });
    }
    Ok(())
}
