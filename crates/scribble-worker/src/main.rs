//! Scribble interpreter worker.
//!
//! Speaks the playground line protocol on stdin/stdout and runs Python
//! code with a host interpreter. Logs go to stderr; stdout carries only
//! protocol messages.

use scribble_core::{PlaygroundConfig, PythonLoader, serve};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Never log to stdout: it is the event stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Only the environment layer applies; the host passes what it needs.
    let mut config = PlaygroundConfig::default();
    config
        .apply_env(|key| std::env::var(key).ok())
        .map_err(|e| anyhow::anyhow!("{}", e.with_hint()))?;

    info!(pid = std::process::id(), "Worker starting");

    serve(
        tokio::io::stdin(),
        tokio::io::stdout(),
        PythonLoader::from_config(&config),
    )
    .await
    .map_err(|e| anyhow::anyhow!("{}", e.with_hint()))?;

    info!("Worker exiting");
    Ok(())
}
