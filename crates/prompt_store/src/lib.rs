//! File-backed storage for the artifacts a chat request refers to by name:
//! sessions, contexts, patterns and strategies, plus the placeholder templating
//! applied to patterns and user input.

mod error;
mod paths;
mod session;
mod store;
pub mod template;

pub use error::{ArtifactKind, StoreError};
pub use paths::{validate_name, PromptLayout};
pub use session::Session;
pub use store::{ChatStorage, FsPromptStore, Strategy, StrategyLoader, INPUT_SENTINEL};
pub use template::{TemplateError, INPUT_VARIABLE};
