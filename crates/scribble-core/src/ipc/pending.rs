//! Pending-run bookkeeping.
//!
//! Every submitted run owns a single-resolution completion keyed by its
//! request id. Resolving removes the entry, so a second resolution for the
//! same id is rejected rather than silently delivered twice.

use std::sync::Mutex;

use rustc_hash::FxHashMap;
use tokio::sync::oneshot;

use super::protocol::RequestId;
use crate::error::{Error, Result};
use crate::interpreter::RunResult;

/// Receiving side of a pending run.
///
/// Resolves to the run's result, or to `Err(RecvError)` if the worker went
/// away before answering.
pub type Completion = oneshot::Receiver<RunResult>;

/// Table of runs awaiting their terminal event.
#[derive(Default)]
pub(crate) struct PendingRuns {
    slots: Mutex<FxHashMap<RequestId, oneshot::Sender<RunResult>>>,
}

impl PendingRuns {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a run and get its completion.
    pub(crate) fn register(&self, id: RequestId) -> Completion {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id, tx);
        rx
    }

    /// Drop a registration whose request never reached the worker.
    pub(crate) fn forget(&self, id: RequestId) {
        self.lock().remove(&id);
    }

    /// Complete run `id` with `result`.
    ///
    /// Fails with `Error::UnknownRequest` if `id` is not pending, including
    /// when it was already resolved.
    pub(crate) fn resolve(&self, id: RequestId, result: RunResult) -> Result<()> {
        let slot = self.lock().remove(&id).ok_or(Error::UnknownRequest(id))?;
        // The waiter may have given up; that's not the worker's fault.
        let _ = slot.send(result);
        Ok(())
    }

    /// Fail every pending run with `reason`.
    pub(crate) fn fail_all(&self, reason: &str) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        let count = drained.len();
        for (_, slot) in drained {
            let _ = slot.send(Err(reason.to_string()));
        }
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FxHashMap<RequestId, oneshot::Sender<RunResult>>> {
        // A panic while holding this lock cannot leave the map inconsistent.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
