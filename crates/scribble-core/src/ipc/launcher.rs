//! Ways of starting an interpreter worker.
//!
//! A launcher produces a `WorkerTransport`: a byte pipe in each direction
//! carrying the line protocol, plus the child process when there is one.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tracing::{debug, error};

use crate::config::PlaygroundConfig;
use crate::error::{Error, Result};
use crate::interpreter::{RuntimeLoader, serve};

/// Capacity of the in-memory pipe used by `InProcessLauncher`.
const PIPE_CAPACITY: usize = 64 * 1024;

const WORKER_BINARY: &str = if cfg!(windows) {
    "scribble-worker.exe"
} else {
    "scribble-worker"
};

/// Connection to a freshly started worker.
pub struct WorkerTransport {
    /// Worker → host event stream.
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    /// Host → worker request stream.
    pub writer: Box<dyn AsyncWrite + Send + Unpin>,
    /// Worker process, if the worker lives in one.
    pub process: Option<Child>,
}

/// Starts interpreter workers.
///
/// Called at most once per `Session`; the result is cached there.
pub trait WorkerLauncher: Send + Sync {
    /// Start a worker. Must be called from within a Tokio runtime.
    fn launch(&self) -> Result<WorkerTransport>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

fn current_runtime() -> Result<tokio::runtime::Handle> {
    tokio::runtime::Handle::try_current().map_err(|e| {
        Error::WorkerConstruction(format!("launching a worker requires a Tokio runtime: {}", e))
    })
}

/// Runs the `scribble-worker` binary as a child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    /// Explicit binary path, checked before any search.
    worker_path: Option<PathBuf>,
    /// Extra environment for the child.
    env: Vec<(&'static str, String)>,
}

impl ProcessLauncher {
    pub fn new(worker_path: Option<PathBuf>) -> Self {
        Self {
            worker_path,
            env: Vec::new(),
        }
    }

    /// Launcher whose worker inherits the relevant parts of `config`.
    pub fn from_config(config: &PlaygroundConfig) -> Self {
        Self {
            worker_path: config.worker_path.clone(),
            env: config.worker_env(),
        }
    }

    /// Find the scribble-worker binary path.
    ///
    /// Looks in the following order:
    /// 1. The configured path (`SCRIBBLE_WORKER_PATH`)
    /// 2. Same directory as the current executable
    /// 3. System PATH
    /// 4. `target/{debug,release}` when run through cargo
    fn find_worker_binary(&self) -> Result<PathBuf> {
        if let Some(path) = &self.worker_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(Error::WorkerConstruction(format!(
                "configured worker binary '{}' does not exist",
                path.display()
            )));
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(PathBuf::from))
        {
            let candidate = exe_dir.join(WORKER_BINARY);
            if candidate.exists() {
                return Ok(candidate);
            }
            // Integration tests run from target/<profile>/deps.
            if let Some(profile_dir) = exe_dir.parent() {
                let candidate = profile_dir.join(WORKER_BINARY);
                if candidate.exists() {
                    return Ok(candidate);
                }
            }
        }

        if let Ok(path) = which::which(WORKER_BINARY) {
            return Ok(path);
        }

        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            for profile in ["debug", "release"] {
                let path = PathBuf::from(&manifest_dir)
                    .join("..")
                    .join("..")
                    .join("target")
                    .join(profile)
                    .join(WORKER_BINARY);
                if path.exists() {
                    return Ok(path.canonicalize().unwrap_or(path));
                }
            }
        }

        Err(Error::WorkerConstruction(
            "could not find scribble-worker binary; set SCRIBBLE_WORKER_PATH or ensure it's in PATH"
                .to_string(),
        ))
    }
}

impl WorkerLauncher for ProcessLauncher {
    fn launch(&self) -> Result<WorkerTransport> {
        current_runtime()?;
        let worker_path = self.find_worker_binary()?;
        debug!("Spawning worker {}", worker_path.display());

        let mut child = Command::new(&worker_path)
            .envs(self.env.iter().map(|(k, v)| (*k, v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // Worker logs go to our stderr
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::WorkerConstruction(format!(
                    "failed to spawn worker process '{}': {}",
                    worker_path.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::WorkerConstruction("failed to get worker stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::WorkerConstruction("failed to get worker stdout".to_string()))?;

        Ok(WorkerTransport {
            reader: Box::new(stdout),
            writer: Box::new(stdin),
            process: Some(child),
        })
    }

    fn describe(&self) -> String {
        match &self.worker_path {
            Some(path) => format!("process ({})", path.display()),
            None => "process".to_string(),
        }
    }
}

/// Runs the worker bootstrap on a Tokio task in this process.
///
/// Same protocol and state machine as the worker binary, over an in-memory
/// pipe. Useful for embedding and for tests.
#[derive(Debug, Clone)]
pub struct InProcessLauncher<L> {
    loader: L,
}

impl<L> InProcessLauncher<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }
}

impl<L> WorkerLauncher for InProcessLauncher<L>
where
    L: RuntimeLoader + Clone + Sync,
{
    fn launch(&self) -> Result<WorkerTransport> {
        let runtime = current_runtime()?;

        let (host, worker) = tokio::io::duplex(PIPE_CAPACITY);
        let (worker_rx, worker_tx) = tokio::io::split(worker);
        let (host_rx, host_tx) = tokio::io::split(host);

        let loader = self.loader.clone();
        runtime.spawn(async move {
            if let Err(e) = serve(worker_rx, worker_tx, loader).await {
                error!("In-process worker stopped: {}", e);
            }
        });

        Ok(WorkerTransport {
            reader: Box::new(host_rx),
            writer: Box::new(host_tx),
            process: None,
        })
    }

    fn describe(&self) -> String {
        "in-process".to_string()
    }
}
