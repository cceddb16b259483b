//! Error types for scribble-core.

use thiserror::Error;

use crate::ipc::RequestId;

/// Result type for scribble-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in scribble-core.
#[derive(Debug, Error)]
pub enum Error {
    /// The interpreter worker could not be started.
    #[error("failed to start interpreter worker: {0}")]
    WorkerConstruction(String),

    /// The interpreter worker is gone (exited or shut down).
    #[error("interpreter worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// The worker did not signal readiness in time.
    #[error("interpreter worker not ready after {0} ms")]
    ReadyTimeout(u64),

    /// A wire message could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A terminal event referenced a request that is not pending.
    #[error("no pending run with id {0}")]
    UnknownRequest(RequestId),

    /// The embedded language runtime failed to load.
    #[error("runtime failed to load: {0}")]
    RuntimeLoad(String),

    /// JSX source could not be compiled.
    #[error("compile error at {line}:{column}: {message}")]
    Compile {
        message: String,
        line: usize,
        column: usize,
    },

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Render the error with a recovery hint where one is known.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Error::WorkerConstruction(_) => Some(
                "build the worker with `cargo build -p scribble-worker`, set SCRIBBLE_WORKER_PATH, \
                 or pass --in-process",
            ),
            Error::ReadyTimeout(_) => {
                Some("raise SCRIBBLE_READY_TIMEOUT_MS or check that python3 is installed")
            }
            Error::RuntimeLoad(_) => Some("set SCRIBBLE_PYTHON to a working Python interpreter"),
            Error::Config(_) => Some("check the JSON syntax of the configuration file"),
            _ => None,
        };

        match hint {
            Some(hint) => format!("{}\n  hint: {}", self, hint),
            None => self.to_string(),
        }
    }
}
