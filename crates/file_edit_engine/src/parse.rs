use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::FileChangeError;

pub const FILE_CHANGES_MARKER: &str = "__CREATE_CODING_FEATURE_FILE_CHANGES__";

/// Per-file content limit (10 MiB).
pub const MAX_CONTENT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOperation {
    Create,
    Update,
}

impl FileOperation {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            _ => None,
        }
    }

    /// One-letter code used in apply summaries.
    #[must_use]
    pub fn code(&self) -> char {
        match self {
            Self::Create => 'A',
            Self::Update => 'M',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub operation: FileOperation,
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChanges {
    pub summary: String,
    pub changes: Vec<FileChange>,
}

#[derive(Deserialize)]
struct RawFileChange {
    operation: String,
    path: String,
    #[serde(default)]
    content: String,
}

/// Splits a response into its summary and file changes.
///
/// Text without the marker is all summary and yields no changes.
pub fn parse_file_changes(text: &str) -> Result<ParsedChanges, FileChangeError> {
    let Some((summary, region)) = text.split_once(FILE_CHANGES_MARKER) else {
        return Ok(ParsedChanges {
            summary: text.to_owned(),
            changes: Vec::new(),
        });
    };

    let json = json_array(strip_code_fence(region.trim()))?;
    let raw = serde_json::from_str::<Vec<RawFileChange>>(json)?;
    let changes = raw
        .into_iter()
        .enumerate()
        .map(|(index, change)| validate_change(index, change))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedChanges {
        summary: summary.trim().to_owned(),
        changes,
    })
}

fn strip_code_fence(region: &str) -> &str {
    let Some(rest) = region.strip_prefix("```") else {
        return region;
    };
    // drop the info string line, e.g. ```json
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn json_array(region: &str) -> Result<&str, FileChangeError> {
    match (region.find('['), region.rfind(']')) {
        (Some(start), Some(end)) if start < end => Ok(&region[start..=end]),
        _ => Err(FileChangeError::MissingJsonArray),
    }
}

fn validate_change(index: usize, raw: RawFileChange) -> Result<FileChange, FileChangeError> {
    let path = raw.path.trim().to_owned();
    if path.is_empty() {
        return Err(FileChangeError::EmptyPath { index });
    }
    if !is_contained(Path::new(&path)) {
        return Err(FileChangeError::PathEscapesRoot { path });
    }

    let Some(operation) = FileOperation::parse(raw.operation.trim()) else {
        return Err(FileChangeError::UnsupportedOperation {
            operation: raw.operation,
            path,
        });
    };

    if raw.content.len() > MAX_CONTENT_BYTES {
        return Err(FileChangeError::ContentTooLarge {
            path,
            size: raw.content.len(),
            limit: MAX_CONTENT_BYTES,
        });
    }

    Ok(FileChange {
        operation,
        path,
        content: raw.content,
    })
}

/// True when `path` is relative and never climbs above its starting directory.
pub(crate) fn is_contained(path: &Path) -> bool {
    let mut depth = 0_usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(next) => depth = next,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}
