use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileChangeError {
    #[error("no JSON array found after the file changes marker")]
    MissingJsonArray,

    #[error("invalid file changes JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file change #{index} has an empty path")]
    EmptyPath { index: usize },

    #[error("path escapes the project root: {path}")]
    PathEscapesRoot { path: String },

    #[error("unsupported operation '{operation}' for {path}")]
    UnsupportedOperation { operation: String, path: String },

    #[error("content for {path} is {size} bytes, above the {limit} byte limit")]
    ContentTooLarge {
        path: String,
        size: usize,
        limit: usize,
    },

    #[error("file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("file does not exist: {path}")]
    Missing { path: PathBuf },

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileChangeError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
