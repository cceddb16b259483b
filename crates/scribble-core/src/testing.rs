//! Fakes shared by unit tests.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::interpreter::{RunResult, Runtime, RuntimeLoader};
use crate::ipc::{InProcessLauncher, WorkerLauncher, WorkerTransport};

/// Pretends to be Python: `print('x')` prints `x`, `raise` fails, and
/// `sleep N` waits N milliseconds before answering.
pub(crate) struct FakePython;

impl Runtime for FakePython {
    fn run(&self, code: String) -> impl Future<Output = RunResult> + Send {
        async move {
            if let Some(ms) = code.strip_prefix("sleep ") {
                let ms: u64 = ms.trim().parse().map_err(|_| "bad sleep".to_string())?;
                tokio::time::sleep(Duration::from_millis(ms)).await;
                return Ok(format!("slept {}", ms));
            }
            if let Some(msg) = code.strip_prefix("raise ") {
                return Err(format!("Traceback (most recent call last):\n{}", msg));
            }
            match code.strip_prefix("print('").and_then(|rest| rest.strip_suffix("')")) {
                Some(text) => Ok(text.to_string()),
                None => Ok(String::new()),
            }
        }
    }
}

/// Loads `FakePython` once its gate opens.
#[derive(Clone)]
pub(crate) struct FakeLoader {
    gate: watch::Receiver<bool>,
}

impl FakeLoader {
    /// A loader that finishes immediately.
    pub(crate) fn ready() -> Self {
        let (tx, rx) = watch::channel(true);
        drop(tx);
        Self { gate: rx }
    }

    /// A loader held in `Loading` until the returned sender sends `true`.
    pub(crate) fn gated() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { gate: rx })
    }
}

impl RuntimeLoader for FakeLoader {
    type Runtime = FakePython;

    fn load(self) -> impl Future<Output = Result<FakePython>> + Send {
        let mut gate = self.gate;
        async move {
            // A dropped sender leaves the last value in place.
            let _ = gate.wait_for(|open| *open).await;
            Ok(FakePython)
        }
    }
}

/// Counts launches before delegating to an in-process worker.
pub(crate) struct CountingLauncher {
    inner: InProcessLauncher<FakeLoader>,
    pub(crate) launches: Arc<AtomicUsize>,
}

impl CountingLauncher {
    pub(crate) fn new(loader: FakeLoader) -> Self {
        Self {
            inner: InProcessLauncher::new(loader),
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl WorkerLauncher for CountingLauncher {
    fn launch(&self) -> Result<WorkerTransport> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.inner.launch()
    }

    fn describe(&self) -> String {
        "counting".to_string()
    }
}

/// Always fails to construct a worker.
#[derive(Default)]
pub(crate) struct BrokenLauncher {
    pub(crate) launches: Arc<AtomicUsize>,
}

impl WorkerLauncher for BrokenLauncher {
    fn launch(&self) -> Result<WorkerTransport> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Err(Error::WorkerConstruction("worker scripts are blocked".to_string()))
    }

    fn describe(&self) -> String {
        "broken".to_string()
    }
}
