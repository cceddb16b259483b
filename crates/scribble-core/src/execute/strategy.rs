//! The strategy seam between the dispatcher and the ways code gets run.

use tokio::task::JoinHandle;

use super::output::SharedSink;
use crate::ipc::RequestId;

/// How a strategy runs code, and what that means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Sent to the interpreter worker. Returns immediately; output arrives
    /// later.
    Isolated,
    /// Evaluated on the calling thread, which is blocked until evaluation
    /// finishes. This is the only capability that may block the caller.
    InProcess,
    /// Compiled and rendered on the blocking pool. Returns immediately.
    CompileAndMount,
}

impl Capability {
    pub fn describe(self) -> &'static str {
        match self {
            Capability::Isolated => "isolated worker",
            Capability::InProcess => "in-process",
            Capability::CompileAndMount => "compile and mount",
        }
    }
}

/// One way of executing source text.
///
/// Implementations report everything through `sink`; the returned
/// `RunOutcome` only says whether more output is still coming.
pub trait ExecutionStrategy: Send + Sync {
    fn capability(&self) -> Capability;

    /// Start running `source`. Must be called from within a Tokio runtime.
    fn execute(&self, source: &str, sink: &SharedSink) -> RunOutcome;
}

/// What `run` left behind.
#[derive(Debug)]
pub enum RunOutcome {
    /// All output for the run has been appended.
    Completed,
    /// Output is still on its way.
    Pending(PendingRun),
}

impl RunOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, RunOutcome::Pending(_))
    }

    /// Wait until the run's output has been appended.
    pub async fn finished(self) {
        if let RunOutcome::Pending(pending) = self {
            pending.wait().await;
        }
    }
}

/// A run whose terminal output has not been appended yet.
#[derive(Debug)]
pub struct PendingRun {
    task: JoinHandle<()>,
    request_id: Option<RequestId>,
}

impl PendingRun {
    pub(crate) fn new(task: JoinHandle<()>, request_id: Option<RequestId>) -> Self {
        Self { task, request_id }
    }

    /// Worker request id, for runs sent to the worker.
    pub fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }

    /// Resolves once the run's terminal output is in the sink.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            tracing::warn!("Run task failed: {}", e);
        }
    }
}
