//! Playground session: owns at most one interpreter worker.

use std::sync::OnceLock;

use tracing::{error, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ipc::{WorkerHandle, WorkerLauncher};

/// Context object for one playground session.
///
/// The worker is constructed lazily by the first `acquire` and then shared.
/// Construction happens at most once: a failure is remembered and returned
/// by every later `acquire` without trying again.
pub struct Session {
    id: Uuid,
    launcher: Box<dyn WorkerLauncher>,
    worker: OnceLock<std::result::Result<WorkerHandle, String>>,
}

impl Session {
    pub fn new(launcher: impl WorkerLauncher + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            launcher: Box::new(launcher),
            worker: OnceLock::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the session's worker, starting it on first use.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn acquire(&self) -> Result<WorkerHandle> {
        self.worker
            .get_or_init(|| self.construct())
            .clone()
            .map_err(Error::WorkerConstruction)
    }

    fn construct(&self) -> std::result::Result<WorkerHandle, String> {
        let label = self.launcher.describe();
        info!(session = %self.id, launcher = %label, "Constructing interpreter worker");

        match self.launcher.launch() {
            Ok(transport) => Ok(WorkerHandle::start(transport, label)),
            Err(e) => {
                error!(session = %self.id, "Interpreter worker construction failed: {}", e);
                Err(match e {
                    Error::WorkerConstruction(msg) => msg,
                    other => other.to_string(),
                })
            }
        }
    }

    /// The worker, if one was constructed. Never starts one.
    pub fn worker(&self) -> Option<WorkerHandle> {
        self.worker.get().and_then(|slot| slot.as_ref().ok().cloned())
    }

    /// Whether the session's worker exists and has announced readiness.
    pub fn is_ready(&self) -> bool {
        self.worker().is_some_and(|worker| worker.is_ready())
    }

    /// Stop the worker, if any. Safe to call more than once.
    pub async fn shutdown(&self) -> Result<()> {
        match self.worker() {
            Some(worker) => {
                info!(session = %self.id, "Session shutting down");
                worker.shutdown().await
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BrokenLauncher, CountingLauncher, FakeLoader};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_acquire_constructs_once_and_reuses() {
        let launcher = CountingLauncher::new(FakeLoader::ready());
        let launches = launcher.launches.clone();
        let session = Session::new(launcher);
        assert!(session.worker().is_none());

        let first = session.acquire().unwrap();
        let second = session.acquire().unwrap();
        assert_eq!(launches.load(Ordering::SeqCst), 1);

        first.wait_ready(WAIT).await.unwrap();
        assert!(second.is_ready());
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_readiness_follows_the_worker() {
        let (open, loader) = FakeLoader::gated();
        let session = Session::new(CountingLauncher::new(loader));
        let worker = session.acquire().unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!session.is_ready());

        open.send(true).unwrap();
        worker.wait_ready(WAIT).await.unwrap();
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_construction_failure_is_cached() {
        let launcher = BrokenLauncher::default();
        let launches = launcher.launches.clone();
        let session = Session::new(launcher);

        for _ in 0..3 {
            match session.acquire() {
                Err(Error::WorkerConstruction(msg)) => assert_eq!(msg, "worker scripts are blocked"),
                other => panic!("expected construction failure, got {:?}", other.err()),
            }
        }
        assert_eq!(launches.load(Ordering::SeqCst), 1);
        assert!(!session.is_ready());
        session.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let session = Session::new(CountingLauncher::new(FakeLoader::ready()));
        let worker = session.acquire().unwrap();
        worker.wait_ready(WAIT).await.unwrap();

        session.shutdown().await.unwrap();
        session.shutdown().await.unwrap();
        assert!(worker.is_shut_down());
        assert!(worker.submit("print('x')").is_err());
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        let a = Session::new(BrokenLauncher::default());
        let b = Session::new(BrokenLauncher::default());
        assert_ne!(a.id(), b.id());
    }
}
