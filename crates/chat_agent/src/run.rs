use anyhow::Context;
use chat_orchestrator::{ChatError, ChatEvent, ChatService, PromptBatch};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const EVENT_BUFFER: usize = 64;

/// Reads one JSON prompt batch from `input` and writes its events to `output`
/// as SSE frames. Returns once the batch finished or was cancelled.
pub async fn run_batch<R, W>(
    service: &ChatService,
    mut input: R,
    mut output: W,
    cancel: CancellationToken,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .await
        .context("reading prompt batch")?;
    let batch: PromptBatch = serde_json::from_str(&text).context("parsing prompt batch")?;

    let (events, mut received) = mpsc::channel::<ChatEvent>(EVENT_BUFFER);
    let write = async move {
        while let Some(event) = received.recv().await {
            let frame = event.to_sse_frame()?;
            output.write_all(frame.as_bytes()).await?;
            output.flush().await?;
        }
        anyhow::Ok(())
    };

    let (outcome, written) = tokio::join!(service.run_prompts(batch, events, cancel), write);
    written.context("writing events")?;
    match outcome {
        Ok(()) => info!("prompt batch finished"),
        Err(ChatError::Cancelled) => warn!("prompt batch cancelled"),
        Err(error) => return Err(error).context("running prompt batch"),
    }
    Ok(())
}
