//! Output sinks and per-run failures.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

/// Prefix of every failure shown to the user.
pub const FAILURE_PREFIX: &str = "Error:\n";

/// A non-fatal problem with one run, shown in the output area.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("worker not ready")]
    NotReady,

    #[error("language not supported")]
    Unsupported,

    #[error("a previous run is still pending")]
    Busy,

    #[error("{0}")]
    WorkerUnavailable(String),

    #[error("{0}")]
    Compile(String),

    #[error("{0}")]
    Runtime(String),
}

impl Failure {
    /// The text appended to the sink.
    pub fn render(&self) -> String {
        format!("{}{}", FAILURE_PREFIX, self)
    }
}

/// Where run output goes.
///
/// Output is push-based: the dispatcher clears the sink before every run,
/// then appends chunks as they become available, possibly after `run` has
/// returned.
pub trait OutputSink: Send + Sync {
    /// Reset the output area (text and mount point).
    fn clear(&self);

    /// Append a chunk, rendered verbatim.
    fn append(&self, chunk: &str);

    /// Replace the markup at the mount point `mount_id`.
    fn mount(&self, mount_id: &str, html: &str) {
        let _ = (mount_id, html);
    }
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn OutputSink>;

#[derive(Debug, Default)]
struct BufferState {
    chunks: Vec<String>,
    mounted: Option<(String, String)>,
}

/// In-memory output area.
///
/// Clones share the same buffer, so a host can keep one clone for reading
/// while the dispatcher writes into another.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    state: Arc<Mutex<BufferState>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended since the last clear, concatenated.
    pub fn contents(&self) -> String {
        self.lock().chunks.concat()
    }

    pub fn chunks(&self) -> Vec<String> {
        self.lock().chunks.clone()
    }

    /// Markup at the mount point, with its id.
    pub fn mounted(&self) -> Option<(String, String)> {
        self.lock().mounted.clone()
    }

    pub fn is_empty(&self) -> bool {
        let state = self.lock();
        state.chunks.is_empty() && state.mounted.is_none()
    }

    /// Whether any appended chunk is a failure report.
    pub fn has_failure(&self) -> bool {
        self.lock()
            .chunks
            .iter()
            .any(|chunk| chunk.starts_with(FAILURE_PREFIX))
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutputSink for OutputBuffer {
    fn clear(&self) {
        let mut state = self.lock();
        state.chunks.clear();
        state.mounted = None;
    }

    fn append(&self, chunk: &str) {
        self.lock().chunks.push(chunk.to_string());
    }

    fn mount(&self, mount_id: &str, html: &str) {
        self.lock().mounted = Some((mount_id.to_string(), html.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_rendering() {
        assert_eq!(Failure::NotReady.render(), "Error:\nworker not ready");
        assert_eq!(Failure::Unsupported.render(), "Error:\nlanguage not supported");
        assert_eq!(
            Failure::Runtime("ReferenceError: x is not defined".to_string()).render(),
            "Error:\nReferenceError: x is not defined"
        );
    }

    #[test]
    fn test_buffer_clones_share_state() {
        let buffer = OutputBuffer::new();
        let writer: SharedSink = Arc::new(buffer.clone());

        writer.append("a");
        writer.append("b\n");
        writer.mount("react-mount", "<p>x</p>");
        assert_eq!(buffer.contents(), "ab\n");
        assert_eq!(buffer.chunks(), vec!["a", "b\n"]);
        assert_eq!(
            buffer.mounted(),
            Some(("react-mount".to_string(), "<p>x</p>".to_string()))
        );

        assert!(!buffer.has_failure());

        writer.append(&Failure::Busy.render());
        assert!(buffer.has_failure());

        writer.clear();
        assert!(buffer.is_empty());
    }
}
