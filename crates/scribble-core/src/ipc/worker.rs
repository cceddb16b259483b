//! Host-side handle to a running interpreter worker.
//!
//! The handle owns two background tasks: a writer draining queued requests
//! into the worker, and a reader decoding events, publishing readiness and
//! resolving pending runs by id. Callers never block on the worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::Child;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, warn};

use super::launcher::WorkerTransport;
use super::pending::{Completion, PendingRuns};
use super::protocol::{Event, Request, RequestId, read_message, write_message};
use crate::error::{Error, Result};

/// How long `shutdown` waits for a worker process to exit on its own.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Observable worker status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Status {
    /// Set once by the first `ready` event; never cleared.
    ready: bool,
    /// The event stream ended.
    exited: bool,
}

/// State shared between the handle and its reader task.
struct Shared {
    status: watch::Sender<Status>,
    pending: PendingRuns,
}

impl Shared {
    fn mark_ready(&self) {
        let changed = self.status.send_if_modified(|status| {
            if status.ready {
                false
            } else {
                status.ready = true;
                true
            }
        });
        if changed {
            info!("Interpreter worker ready");
        } else {
            debug!("Ignoring duplicate ready event");
        }
    }

    fn mark_exited(&self) {
        self.status.send_if_modified(|status| {
            let changed = !status.exited;
            status.exited = true;
            changed
        });
    }
}

/// Cheaply cloneable handle to one interpreter worker.
///
/// Dropping the last clone closes the request stream; a worker process is
/// killed when its `Child` is dropped.
#[derive(Clone)]
pub struct WorkerHandle {
    inner: Arc<Inner>,
}

struct Inner {
    requests: mpsc::UnboundedSender<Request>,
    shared: Arc<Shared>,
    status: watch::Receiver<Status>,
    next_id: AtomicU64,
    shut_down: AtomicBool,
    process: Mutex<Option<Child>>,
    pid: Option<u32>,
    label: String,
}

impl WorkerHandle {
    /// Attach to a freshly launched worker and start the I/O tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(transport: WorkerTransport, label: impl Into<String>) -> Self {
        let WorkerTransport {
            reader,
            writer,
            process,
        } = transport;

        let (status_tx, status_rx) = watch::channel(Status::default());
        let shared = Arc::new(Shared {
            status: status_tx,
            pending: PendingRuns::new(),
        });
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();

        tokio::spawn(write_requests(writer, requests_rx));
        tokio::spawn(read_events(reader, Arc::clone(&shared)));

        let pid = process.as_ref().and_then(|child| child.id());
        let label = label.into();
        info!(worker = %label, pid = ?pid, "Interpreter worker started");

        Self {
            inner: Arc::new(Inner {
                requests: requests_tx,
                shared,
                status: status_rx,
                next_id: AtomicU64::new(1),
                shut_down: AtomicBool::new(false),
                process: Mutex::new(process),
                pid,
                label,
            }),
        }
    }

    /// Whether the worker has announced readiness. Never reverts to `false`.
    pub fn is_ready(&self) -> bool {
        self.inner.status.borrow().ready
    }

    /// Whether the worker's event stream has ended.
    pub fn has_exited(&self) -> bool {
        self.inner.status.borrow().exited
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Number of runs awaiting their terminal event.
    pub fn pending_count(&self) -> usize {
        self.inner.shared.pending.len()
    }

    /// Process id of the worker, if it runs in its own process.
    pub fn pid(&self) -> Option<u32> {
        self.inner.pid
    }

    /// Launcher description, for logs.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Wait until the worker is ready.
    ///
    /// Fails if the worker exits first or `timeout` elapses.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let mut status = self.inner.status.clone();
        let waited = tokio::time::timeout(
            timeout,
            status.wait_for(|status| status.ready || status.exited),
        )
        .await;

        match waited {
            Err(_) => Err(Error::ReadyTimeout(timeout.as_millis() as u64)),
            Ok(Err(_)) => Err(Error::WorkerUnavailable("worker handle closed".to_string())),
            Ok(Ok(status)) if status.ready => Ok(()),
            Ok(Ok(_)) => Err(Error::WorkerUnavailable(
                "worker exited before becoming ready".to_string(),
            )),
        }
    }

    /// Send `code` to the worker as a new run.
    ///
    /// Returns the allocated request id and a completion that resolves
    /// exactly once with the run's result. Does not check readiness; that
    /// is the dispatcher's policy.
    pub fn submit(&self, code: impl Into<String>) -> Result<(RequestId, Completion)> {
        self.ensure_available()?;

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let completion = self.inner.shared.pending.register(id);

        // The reader may have failed all pending runs between the check
        // above and the registration.
        if let Err(e) = self.ensure_available() {
            self.inner.shared.pending.forget(id);
            return Err(e);
        }

        let request = Request::Run {
            id,
            code: code.into(),
        };
        if self.inner.requests.send(request).is_err() {
            self.inner.shared.pending.forget(id);
            return Err(Error::WorkerUnavailable(
                "worker request stream closed".to_string(),
            ));
        }

        debug!(id, "Run submitted");
        Ok((id, completion))
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(Error::WorkerUnavailable("worker has been shut down".to_string()));
        }
        if self.has_exited() {
            return Err(Error::WorkerUnavailable("worker has exited".to_string()));
        }
        Ok(())
    }

    /// Ask the worker to stop, then make sure it does.
    ///
    /// Waits briefly for a worker process to exit and kills it otherwise.
    /// Pending runs are failed. Idempotent.
    pub async fn shutdown(&self) -> Result<()> {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!(worker = %self.inner.label, "Shutting down interpreter worker");
        let _ = self.inner.requests.send(Request::Shutdown);

        let mut process = self.inner.process.lock().await;
        if let Some(child) = process.as_mut() {
            match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
                Ok(Ok(status)) => debug!("Worker exited with {}", status),
                Ok(Err(e)) => warn!("Failed to wait for worker: {}", e),
                Err(_) => {
                    warn!("Worker did not exit within {:?}, killing", SHUTDOWN_GRACE);
                    child.kill().await?;
                }
            }
        }

        let failed = self.inner.shared.pending.fail_all("worker shut down");
        if failed > 0 {
            debug!(failed, "Failed pending runs on shutdown");
        }
        Ok(())
    }
}

async fn write_requests<W>(mut writer: W, mut requests: mpsc::UnboundedReceiver<Request>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(request) = requests.recv().await {
        if let Err(e) = write_message(&mut writer, &request).await {
            warn!("Failed to write to worker: {}", e);
            break;
        }
    }
}

async fn read_events<R>(reader: R, shared: Arc<Shared>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match read_message::<_, Event>(&mut lines).await {
            Ok(Some(Event::Ready)) => shared.mark_ready(),
            Ok(Some(Event::Output { id, result })) => {
                if let Err(e) = shared.pending.resolve(id, Ok(result)) {
                    warn!("Dropping output event: {}", e);
                }
            }
            Ok(Some(Event::Error { id, error })) => {
                if let Err(e) = shared.pending.resolve(id, Err(error)) {
                    warn!("Dropping error event: {}", e);
                }
            }
            Ok(Some(Event::Unrecognized)) => debug!("Ignoring unrecognized event"),
            Ok(None) => break,
            Err(Error::Protocol(msg)) => warn!("Skipping malformed event: {}", msg),
            Err(e) => {
                warn!("Worker event stream failed: {}", e);
                break;
            }
        }
    }

    shared.mark_exited();
    let failed = shared.pending.fail_all("worker exited before answering");
    info!(failed, "Interpreter worker event stream closed");
}
