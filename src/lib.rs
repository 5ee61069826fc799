//! Chat orchestration engine.
//!
//! A [`ChatRequest`] names stored artifacts (session, context, pattern, strategy)
//! and carries the live user message. The [`SessionAssembler`] resolves them into
//! an ordered session, the dispatcher runs the provider exchange blocking or
//! streamed, and the post-processor strips reasoning blocks and applies file
//! edits before the reply is appended to the session.
//!
//! # Public API Overview
//! - [`Chatter`] runs one request end to end against one provider and model.
//! - [`ChatService`] runs ordered prompt batches and emits [`ChatEvent`]s.
//! - [`dispatch`] and [`dispatch_stream`] expose the exchange itself.
//! - [`strip_think_blocks`] removes provider reasoning from a response.

mod assembler;
mod chatter;
mod dispatcher;
mod error;
pub mod events;
mod postprocess;
mod registry;
mod request;
mod service;

pub use crate::assembler::{SessionAssembler, DEFAULT_LANGUAGE};
pub use crate::chatter::{Chatter, FILE_EDIT_PATTERN};
pub use crate::dispatcher::{dispatch, dispatch_stream, StreamDispatch, FRAGMENT_BUFFER};
pub use crate::error::ChatError;
pub use crate::events::{detect_format, ChatEvent, ContentFormat, EventKind};
pub use crate::postprocess::strip_think_blocks;
pub use crate::registry::ProviderRegistry;
pub use crate::request::ChatRequest;
pub use crate::service::{ChatService, PromptBatch, PromptRequest, DEFAULT_MODEL_CONTEXT_LENGTH};
