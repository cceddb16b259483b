//! Wire protocol between the dispatcher and the interpreter worker.
//!
//! Messages are flat JSON objects tagged by a `type` field, one per line.
//! There is no framing beyond the newline and no version field. Runs and
//! their terminal events carry a request id so that every `output`/`error`
//! can be attributed to the `run` that caused it.
//!
//! Both directions decode into closed enums with an explicit
//! `Unrecognized` variant. Unknown tags are not errors: receivers match the
//! variant and drop it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, Lines};

use crate::error::{Error, Result};

/// Identifier correlating a `run` request with its terminal event.
///
/// Allocated per worker handle, strictly increasing from 1.
pub type RequestId = u64;

/// Message sent from the dispatcher to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Execute source code in the worker's runtime.
    Run {
        /// Correlation id echoed by the terminal event.
        id: RequestId,
        /// Source code to execute.
        code: String,
    },

    /// Stop accepting requests and exit once in-flight runs finish.
    Shutdown,

    /// Any tag this side does not know about.
    #[serde(other)]
    Unrecognized,
}

/// Message sent from the worker to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The runtime finished loading. Emitted exactly once per worker.
    Ready,

    /// A run completed successfully.
    Output {
        /// Id of the run this result belongs to.
        id: RequestId,
        /// Textual result of the run.
        result: String,
    },

    /// A run failed.
    Error {
        /// Id of the run this failure belongs to.
        id: RequestId,
        /// Error message reported by the runtime.
        error: String,
    },

    /// Any tag this side does not know about.
    #[serde(other)]
    Unrecognized,
}

impl Event {
    /// Whether this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Output { .. } | Event::Error { .. })
    }

    /// Request id of a terminal event.
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Event::Output { id, .. } | Event::Error { id, .. } => Some(*id),
            Event::Ready | Event::Unrecognized => None,
        }
    }
}

/// Encode a message as a single JSON line (including the trailing newline).
pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    let mut line = serde_json::to_string(message)
        .map_err(|e| Error::Protocol(format!("failed to encode message: {}", e)))?;
    line.push('\n');
    Ok(line)
}

/// Decode a single JSON line.
pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T> {
    serde_json::from_str(line.trim_end())
        .map_err(|e| Error::Protocol(format!("failed to decode message {:?}: {}", line, e)))
}

/// Write a message to an async writer and flush it.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let line = encode(message)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read the next message from a line stream.
///
/// Returns `Ok(None)` at end of stream. Blank lines are skipped. A line
/// that is not a valid message yields `Error::Protocol`; the stream stays
/// usable and the caller may keep reading.
pub async fn read_message<R, T>(lines: &mut Lines<R>) -> Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    loop {
        match lines.next_line().await? {
            None => return Ok(None),
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => return decode(&line).map(Some),
        }
    }
}
