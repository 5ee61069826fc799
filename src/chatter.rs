use std::path::PathBuf;
use std::sync::Arc;

use chat_provider::{ChatMessage, ChatOptions, ChatProvider, FragmentSender};
use file_edit_engine::{apply_file_changes, parse_file_changes};
use prompt_store::{ChatStorage, Session, StrategyLoader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::assembler::SessionAssembler;
use crate::dispatcher::{dispatch, dispatch_stream};
use crate::error::ChatError;
use crate::postprocess::strip_think_blocks;
use crate::request::ChatRequest;

/// Pattern whose responses carry a file-edit region.
pub const FILE_EDIT_PATTERN: &str = "create_coding_feature";

/// Runs one request end to end against a single provider and model: assembly,
/// dispatch, post-processing, and persistence of named sessions.
pub struct Chatter {
    provider: Arc<dyn ChatProvider>,
    storage: Arc<dyn ChatStorage>,
    strategies: Arc<dyn StrategyLoader>,
    model: String,
    model_context_length: usize,
    stream: bool,
    dry_run: bool,
    file_edit_pattern: String,
    project_root: Option<PathBuf>,
}

impl Chatter {
    #[must_use]
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        storage: Arc<dyn ChatStorage>,
        strategies: Arc<dyn StrategyLoader>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            storage,
            strategies,
            model: model.into(),
            model_context_length: 0,
            stream: false,
            dry_run: false,
            file_edit_pattern: FILE_EDIT_PATTERN.to_owned(),
            project_root: None,
        }
    }

    #[must_use]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Dry runs keep reasoning blocks in the response.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_model_context_length(mut self, length: usize) -> Self {
        self.model_context_length = length;
        self
    }

    #[must_use]
    pub fn with_file_edit_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_edit_pattern = pattern.into();
        self
    }

    /// Root that file edits are applied under. Defaults to the current directory.
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    /// Sends `request` and returns the session with the assistant reply appended.
    ///
    /// When streaming, fragments are forwarded to `live` as they arrive unless
    /// reasoning suppression is on.
    pub async fn send(
        &self,
        request: &ChatRequest,
        options: &ChatOptions,
        live: Option<FragmentSender>,
        cancel: &CancellationToken,
    ) -> Result<Session, ChatError> {
        let mut options = options.clone();
        if self.provider.needs_raw_mode(&self.model) {
            options.raw = true;
        }

        let assembler = SessionAssembler::new(self.storage.as_ref(), self.strategies.as_ref());
        let mut session = assembler.build_session(request, options.raw)?;

        let messages = session.vendor_messages();
        if messages.is_empty() {
            self.save(&session)?;
            return Err(ChatError::NoContent);
        }

        options.model = self.model.clone();
        if options.model_context_length == 0 {
            options.model_context_length = self.model_context_length;
        }

        info!(
            provider = self.provider.provider_id(),
            model = %options.model,
            session = session.name.as_deref().unwrap_or(""),
            pattern = request.pattern().unwrap_or(""),
            stream = self.stream,
            "dispatching chat request"
        );

        let mut message = if self.stream {
            let live = if options.suppress_think { None } else { live };
            dispatch_stream(Arc::clone(&self.provider), messages, options.clone())
                .collect(cancel, live)
                .await?
        } else {
            tokio::select! {
                () = cancel.cancelled() => return Err(ChatError::Cancelled),
                result = dispatch(self.provider.as_ref(), &messages, &options) => result?,
            }
        };

        if options.suppress_think && !self.dry_run {
            message = strip_think_blocks(&message, &options.think_start_tag, &options.think_end_tag);
        }

        if message.trim().is_empty() {
            return Err(ChatError::EmptyResponse);
        }

        if request.pattern() == Some(self.file_edit_pattern.as_str()) {
            message = self.apply_file_edits(message);
        }

        info!(
            model = %options.model,
            chars = message.len(),
            "chat response received"
        );
        session.append(ChatMessage::assistant(message));
        self.save(&session)?;
        Ok(session)
    }

    /// Applies the response's file-edit region and returns its summary. A region
    /// that fails to parse leaves the response untouched.
    fn apply_file_edits(&self, message: String) -> String {
        let parsed = match parse_file_changes(&message) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(%error, "failed to parse file changes; keeping raw response");
                return message;
            }
        };

        if !parsed.changes.is_empty() {
            let root = match &self.project_root {
                Some(root) => Some(root.clone()),
                None => std::env::current_dir()
                    .map_err(|error| warn!(%error, "cannot resolve current directory"))
                    .ok(),
            };
            if let Some(root) = root {
                let report = apply_file_changes(&root, &parsed.changes);
                if report.is_success() {
                    info!(
                        files = report.applied.len(),
                        "applied file changes; review them with `git diff`"
                    );
                } else {
                    warn!(
                        applied = report.applied.len(),
                        failed = report.failed.len(),
                        "some file changes were not applied"
                    );
                }
            }
        }

        parsed.summary
    }

    fn save(&self, session: &Session) -> Result<(), ChatError> {
        if session.is_named() {
            self.storage.save_session(session)?;
        }
        Ok(())
    }
}
