use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use similar::TextDiff;
use tracing::{debug, info, warn};

use crate::error::FileChangeError;
use crate::parse::{is_contained, FileChange, FileOperation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    pub operation: FileOperation,
    pub path: PathBuf,
    /// Unified diff against the previous content, for updates that changed text.
    pub diff: Option<String>,
}

#[derive(Debug)]
pub struct FailedChange {
    pub path: String,
    pub error: FileChangeError,
}

/// Outcome of one batch. Order follows the input batch.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub applied: Vec<AppliedChange>,
    pub failed: Vec<FailedChange>,
}

impl ApplyReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Writes `A`/`M` lines for applied changes to `stdout` and one line per
    /// failure to `stderr`.
    pub fn write_summary(
        &self,
        stdout: &mut impl Write,
        stderr: &mut impl Write,
    ) -> io::Result<()> {
        if !self.applied.is_empty() {
            writeln!(stdout, "Success. Updated the following files:")?;
            for change in &self.applied {
                writeln!(stdout, "{} {}", change.operation.code(), change.path.display())?;
            }
        }
        for failure in &self.failed {
            writeln!(stderr, "Failed to apply {}: {}", failure.path, failure.error)?;
        }
        Ok(())
    }
}

/// Resolves a change path against `root`, refusing anything outside it.
pub fn resolve_target(root: &Path, path: &str) -> Result<PathBuf, FileChangeError> {
    if path.trim().is_empty() || !is_contained(Path::new(path)) {
        return Err(FileChangeError::PathEscapesRoot {
            path: path.to_owned(),
        });
    }
    Ok(root.join(path))
}

/// Applies every change independently under `root`.
pub fn apply_file_changes(root: &Path, changes: &[FileChange]) -> ApplyReport {
    let mut report = ApplyReport::default();

    for change in changes {
        match apply_one(root, change) {
            Ok(applied) => {
                if let Some(diff) = &applied.diff {
                    debug!(path = %applied.path.display(), "file change diff:\n{diff}");
                }
                report.applied.push(applied);
            }
            Err(error) => {
                warn!(path = %change.path, %error, "file change failed");
                report.failed.push(FailedChange {
                    path: change.path.clone(),
                    error,
                });
            }
        }
    }

    info!(
        applied = report.applied.len(),
        failed = report.failed.len(),
        root = %root.display(),
        "applied file changes"
    );
    report
}

fn apply_one(root: &Path, change: &FileChange) -> Result<AppliedChange, FileChangeError> {
    let target = resolve_target(root, &change.path)?;

    let diff = match change.operation {
        FileOperation::Create => {
            if target.exists() {
                return Err(FileChangeError::AlreadyExists { path: target });
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|source| FileChangeError::io("creating directory", parent, source))?;
            }
            None
        }
        FileOperation::Update => {
            let previous = fs::read_to_string(&target).map_err(|source| {
                if source.kind() == ErrorKind::NotFound {
                    FileChangeError::Missing {
                        path: target.clone(),
                    }
                } else {
                    FileChangeError::io("reading file", &target, source)
                }
            })?;
            diff_preview(&change.path, &previous, &change.content)
        }
    };

    fs::write(&target, &change.content)
        .map_err(|source| FileChangeError::io("writing file", &target, source))?;

    Ok(AppliedChange {
        operation: change.operation,
        path: target,
        diff,
    })
}

fn diff_preview(path: &str, previous: &str, next: &str) -> Option<String> {
    if previous == next {
        return None;
    }
    let diff = TextDiff::from_lines(previous, next);
    Some(
        diff.unified_diff()
            .context_radius(3)
            .header(&format!("a/{path}"), &format!("b/{path}"))
            .to_string(),
    )
}
