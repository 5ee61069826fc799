use std::io::IsTerminal;

use anyhow::Context;
use chat_agent::config::EnvConfig;
use chat_agent::run::run_batch;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the event stream
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let env = EnvConfig::from_env();
    let service = chat_agent::service_from_env(&env).context("configuring chat service")?;
    info!(
        providers = ?service.registry().ids().collect::<Vec<_>>(),
        stream = env.stream,
        "chat agent ready"
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received; cancelling");
                cancel.cancel();
            }
        }
    });

    run_batch(&service, tokio::io::stdin(), tokio::io::stdout(), cancel).await
}
