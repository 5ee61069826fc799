//! Runs one provider exchange, blocking or streamed.
//!
//! A streamed exchange is a single spawned task writing fragments into a bounded
//! channel. The task reports its error, if any, through a one-slot side channel
//! and its completion through its join handle. The consumer drains the fragment
//! channel until it closes, awaits completion, then reads the error slot once.

use std::sync::Arc;

use chat_provider::{ChatMessage, ChatOptions, ChatProvider, FragmentSender, ProviderError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ChatError;

/// Fragments buffered between the provider task and the consumer.
pub const FRAGMENT_BUFFER: usize = 64;

/// Blocking exchange returning the aggregated text.
pub async fn dispatch(
    provider: &dyn ChatProvider,
    messages: &[ChatMessage],
    options: &ChatOptions,
) -> Result<String, ChatError> {
    Ok(provider.send(messages, options).await?)
}

/// Starts a streamed exchange on its own task.
#[must_use]
pub fn dispatch_stream(
    provider: Arc<dyn ChatProvider>,
    messages: Vec<ChatMessage>,
    options: ChatOptions,
) -> StreamDispatch {
    let (out, fragments) = mpsc::channel(FRAGMENT_BUFFER);
    let (error_tx, error_slot) = mpsc::channel::<ProviderError>(1);

    let done = tokio::spawn(async move {
        if let Err(error) = provider.send_stream(&messages, &options, out).await {
            // the slot has room for exactly this one error
            let _ = error_tx.try_send(error);
        }
    });

    StreamDispatch {
        fragments,
        error_slot,
        done,
    }
}

/// Consumer side of a streamed exchange.
#[derive(Debug)]
pub struct StreamDispatch {
    fragments: mpsc::Receiver<String>,
    error_slot: mpsc::Receiver<ProviderError>,
    done: JoinHandle<()>,
}

impl StreamDispatch {
    /// Next fragment in emission order, or `None` once the provider finished.
    pub async fn next_fragment(&mut self) -> Option<String> {
        self.fragments.recv().await
    }

    /// Waits for the provider task, then reports its error, if any.
    ///
    /// Call after [`next_fragment`](Self::next_fragment) returned `None`.
    pub async fn finish(mut self) -> Result<(), ChatError> {
        self.fragments.close();
        self.done
            .await
            .map_err(|error| ChatError::TaskFailed(error.to_string()))?;
        match self.error_slot.try_recv() {
            Ok(error) => Err(error.into()),
            Err(_) => Ok(()),
        }
    }

    /// Drains the whole stream and returns the concatenated text.
    ///
    /// Each fragment is also forwarded to `live` when given. Cancellation, or the
    /// `live` receiver going away, stops delivery and yields
    /// [`ChatError::Cancelled`]; the provider task is left to wind down on its own.
    pub async fn collect(
        mut self,
        cancel: &CancellationToken,
        live: Option<FragmentSender>,
    ) -> Result<String, ChatError> {
        let mut text = String::new();

        loop {
            let received = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                fragment = self.fragments.recv() => Some(fragment),
            };
            let Some(fragment) = received else {
                debug!("stream cancelled by caller");
                return Err(self.abandon());
            };
            let Some(fragment) = fragment else {
                break;
            };

            text.push_str(&fragment);
            if let Some(live) = &live {
                if live.send(fragment).await.is_err() {
                    warn!("live consumer disconnected; dropping remaining fragments");
                    return Err(self.abandon());
                }
            }
        }

        self.finish().await?;
        Ok(text)
    }

    /// Stops delivery. Dropping the receiver makes the provider's next send fail,
    /// and dropping the join handle detaches the task.
    fn abandon(self) -> ChatError {
        drop(self.fragments);
        ChatError::Cancelled
    }
}
