//! Runs code in the interpreter worker.

use tracing::{debug, warn};

use super::output::{Failure, SharedSink};
use super::strategy::{Capability, ExecutionStrategy, PendingRun, RunOutcome};
use crate::config::OverlapPolicy;
use crate::ipc::WorkerHandle;

pub struct IsolatedStrategy {
    /// The session's worker, or why it could not be constructed.
    worker: std::result::Result<WorkerHandle, String>,
    overlap: OverlapPolicy,
}

impl IsolatedStrategy {
    pub fn new(worker: std::result::Result<WorkerHandle, String>, overlap: OverlapPolicy) -> Self {
        Self { worker, overlap }
    }

    /// Check everything that can fail before contacting the worker.
    fn admit(&self) -> std::result::Result<&WorkerHandle, Failure> {
        let worker = self
            .worker
            .as_ref()
            .map_err(|msg| Failure::WorkerUnavailable(msg.clone()))?;

        if worker.is_shut_down() || worker.has_exited() {
            return Err(Failure::WorkerUnavailable(
                "interpreter worker has exited".to_string(),
            ));
        }
        if !worker.is_ready() {
            return Err(Failure::NotReady);
        }
        if self.overlap == OverlapPolicy::Reject && worker.pending_count() > 0 {
            return Err(Failure::Busy);
        }
        Ok(worker)
    }
}

impl ExecutionStrategy for IsolatedStrategy {
    fn capability(&self) -> Capability {
        Capability::Isolated
    }

    fn execute(&self, source: &str, sink: &SharedSink) -> RunOutcome {
        let worker = match self.admit() {
            Ok(worker) => worker,
            Err(failure) => {
                debug!("Worker run refused: {}", failure);
                sink.append(&failure.render());
                return RunOutcome::Completed;
            }
        };

        let (id, completion) = match worker.submit(source) {
            Ok(submitted) => submitted,
            Err(e) => {
                warn!("Failed to submit run: {}", e);
                sink.append(&Failure::WorkerUnavailable(e.to_string()).render());
                return RunOutcome::Completed;
            }
        };

        let sink = SharedSink::clone(sink);
        let task = tokio::spawn(async move {
            let chunk = match completion.await {
                Ok(Ok(result)) => format!("{}\n", result),
                Ok(Err(error)) => format!("{}\n", Failure::Runtime(error).render()),
                Err(_) => Failure::WorkerUnavailable(
                    "worker exited before completing run".to_string(),
                )
                .render(),
            };
            sink.append(&chunk);
        });

        RunOutcome::Pending(PendingRun::new(task, Some(id)))
    }
}
