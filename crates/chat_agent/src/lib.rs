//! Command-line front end for the chat orchestrator.
//!
//! ## Usage
//!
//! `chat_agent` reads one prompt batch as JSON on stdin and writes one SSE frame per
//! event to stdout. Logs go to stderr, filtered by `RUST_LOG` (default `info`).
//!
//! ```json
//! {
//!   "prompts": [
//!     { "userInput": "hello", "vendor": "mock", "patternName": "summarize" }
//!   ],
//!   "language": "en",
//!   "temperature": 0.7
//! }
//! ```
//!
//! ## Provider bootstrap
//!
//! Every provider the environment can build is registered, and a prompt picks
//! one with its `vendor` field. `CHAT_AGENT_PROVIDER` names the default used
//! when `vendor` is empty:
//!
//! - `mock` (default) for deterministic local runs, always registered
//! - `anthropic` for the Anthropic Messages API, registered when
//!   `CHAT_AGENT_CONFIG_PATH` is set
//! - `openai` for OpenAI-compatible Chat Completions endpoints, registered when
//!   `CHAT_AGENT_OPENAI_CONFIG_PATH` is set
//!
//! `CHAT_AGENT_CONFIG_PATH` names a UTF-8 JSON file with this shape:
//!
//! ```json
//! {
//!   "api_key": "<key>",
//!   "models": ["claude-sonnet-4-5"],
//!   "base_url": "https://api.anthropic.com",
//!   "timeout_sec": 120,
//!   "max_tokens": 4096,
//!   "model_betas": { "claude-sonnet-4-5": ["context-1m-2025-08-07"] }
//! }
//! ```
//!
//! Contract notes:
//! - `api_key` is required and must be non-empty.
//! - `models` is required and must include at least one non-empty model ID.
//! - `timeout_sec` and `max_tokens` are optional and must be > 0 when provided.
//! - Unknown JSON fields are rejected.
//!
//! `CHAT_AGENT_OPENAI_CONFIG_PATH` names a file with `api_key` plus optional
//! `models`, `base_url` and `timeout_sec`. With no `models` the server's model
//! list is used.
//!
//! ## Other settings
//!
//! - `CHAT_AGENT_HOME`: storage root for sessions, contexts, patterns and
//!   strategies. Defaults to `$HOME/.config/chat_agent`.
//! - `CHAT_AGENT_STREAM=1`: emit fragments as they arrive.
//! - `CHAT_AGENT_PROJECT_ROOT`: directory file-edit responses are applied to.
//!   Defaults to the working directory.

pub mod config;
pub mod providers;
pub mod run;

use std::sync::Arc;

use chat_orchestrator::ChatService;
use prompt_store::FsPromptStore;

use crate::config::{ConfigError, EnvConfig};

/// Builds the service described by the environment.
pub fn service_from_env(env: &EnvConfig) -> Result<ChatService, ConfigError> {
    let registry = providers::registry_from_env(env)?;
    let store = Arc::new(FsPromptStore::new(env.storage_root()?));
    let mut service = ChatService::new(registry, store.clone(), store).with_stream(env.stream);
    if let Some(root) = &env.project_root {
        service = service.with_project_root(root.clone());
    }
    Ok(service)
}
