//! Interpreter worker bootstrap.
//!
//! `serve` is the whole life of an interpreter worker: it loads a language
//! runtime in the background, announces readiness once, and answers every
//! `run` request with exactly one terminal event. The `scribble-worker`
//! binary runs it over stdin/stdout; `InProcessLauncher` runs it on a Tokio
//! task over an in-memory pipe.
//!
//! ```text
//!   Loading ──(runtime loaded, emit `ready`)──▶ Ready
//!      │                                          │
//!      └─ run → `error` ("still loading")         └─ run → task → `output` | `error`
//! ```

mod python;

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::ipc::protocol::{Event, Request, RequestId, read_message, write_message};

pub use python::{PythonLoader, PythonRuntime};

/// Outcome of one run inside a runtime: the textual result or an error message.
pub type RunResult = std::result::Result<String, String>;

/// An initialized language runtime that can execute source code.
///
/// Runs may be issued concurrently; ordering between their results is the
/// runtime's business.
pub trait Runtime: Send + Sync + 'static {
    /// Execute `code` to completion.
    fn run(&self, code: String) -> impl Future<Output = RunResult> + Send;
}

/// Asynchronously produces a `Runtime`.
pub trait RuntimeLoader: Send + 'static {
    type Runtime: Runtime;

    /// Load and initialize the runtime.
    fn load(self) -> impl Future<Output = Result<Self::Runtime>> + Send;
}

/// Bootstrap state of a worker.
enum WorkerState<R> {
    Loading,
    Ready(Arc<R>),
}

/// Serve the worker protocol until shutdown or end of input.
///
/// In-flight runs are allowed to finish (and their events are written)
/// before this returns. A runtime load failure is returned as an error
/// without ever emitting `ready`.
pub async fn serve<R, W, L>(reader: R, writer: W, loader: L) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    L: RuntimeLoader,
{
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    let writer_task = tokio::spawn(write_events(writer, event_rx));

    let mut lines = BufReader::new(reader).lines();
    let load = loader.load();
    tokio::pin!(load);

    let mut state: WorkerState<L::Runtime> = WorkerState::Loading;
    let mut runs = JoinSet::new();

    let outcome = loop {
        tokio::select! {
            loaded = &mut load, if matches!(state, WorkerState::Loading) => match loaded {
                Ok(runtime) => {
                    info!("Runtime loaded, worker ready");
                    state = WorkerState::Ready(Arc::new(runtime));
                    let _ = event_tx.send(Event::Ready);
                }
                Err(e) => {
                    error!("Runtime failed to load: {}", e);
                    break Err(e);
                }
            },

            message = read_message::<_, Request>(&mut lines) => match message {
                Ok(Some(Request::Run { id, code })) => match &state {
                    WorkerState::Loading => {
                        debug!(id, "Run received while loading");
                        let _ = event_tx.send(Event::Error {
                            id,
                            error: "runtime is still loading".to_string(),
                        });
                    }
                    WorkerState::Ready(runtime) => {
                        debug!(id, bytes = code.len(), "Run received");
                        runs.spawn(execute(Arc::clone(runtime), id, code, event_tx.clone()));
                    }
                },
                Ok(Some(Request::Shutdown)) => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                Ok(Some(Request::Unrecognized)) => {
                    debug!("Ignoring unrecognized request");
                }
                Ok(None) => {
                    debug!("Request stream closed");
                    break Ok(());
                }
                Err(Error::Protocol(msg)) => {
                    warn!("Skipping malformed request: {}", msg);
                }
                Err(e) => break Err(e),
            },

            Some(_) = runs.join_next(), if !runs.is_empty() => {}
        }
    };

    while runs.join_next().await.is_some() {}
    drop(event_tx);

    match writer_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Event writer stopped: {}", e),
        Err(e) => warn!("Event writer task failed: {}", e),
    }

    outcome
}

/// Run one request and emit its terminal event.
///
/// The runtime call is isolated in its own task so that a panic still
/// produces an `error` event for this id.
async fn execute<R: Runtime>(
    runtime: Arc<R>,
    id: RequestId,
    code: String,
    events: mpsc::UnboundedSender<Event>,
) {
    let outcome = tokio::spawn(async move { runtime.run(code).await }).await;

    let event = match outcome {
        Ok(Ok(result)) => Event::Output { id, result },
        Ok(Err(error)) => Event::Error { id, error },
        Err(e) => Event::Error {
            id,
            error: format!("run aborted: {}", e),
        },
    };

    debug!(id, ok = matches!(event, Event::Output { .. }), "Run finished");
    let _ = events.send(event);
}

async fn write_events<W>(mut writer: W, mut events: mpsc::UnboundedReceiver<Event>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        write_message(&mut writer, &event).await?;
    }
    Ok(())
}
