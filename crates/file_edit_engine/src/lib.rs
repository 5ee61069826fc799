//! Parser and applier for the file-edit region a model may embed in its answer.
//!
//! A response carries the region after [`FILE_CHANGES_MARKER`]: the text before the
//! marker is a human-readable summary, the text after it is a JSON array of
//! `{ "operation", "path", "content" }` objects, optionally inside a code fence.
//!
//! Applying a batch is best effort. Every change is attempted on its own and a
//! failed write never rolls back the ones already made.

mod apply;
mod error;
mod parse;

pub use apply::{apply_file_changes, resolve_target, AppliedChange, ApplyReport, FailedChange};
pub use error::FileChangeError;
pub use parse::{
    parse_file_changes, FileChange, FileOperation, ParsedChanges, FILE_CHANGES_MARKER,
    MAX_CONTENT_BYTES,
};
