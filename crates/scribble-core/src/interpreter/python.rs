//! Python runtime backed by a host interpreter.
//!
//! Each run executes in a fresh `python -I -` child with the code piped on
//! stdin, so runs share no interpreter state and may proceed concurrently.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::{RunResult, Runtime, RuntimeLoader};
use crate::config::PlaygroundConfig;
use crate::error::{Error, Result};

/// Locates and verifies a Python interpreter.
#[derive(Debug, Clone)]
pub struct PythonLoader {
    /// Explicit interpreter path. `None` searches `PATH`.
    interpreter: Option<PathBuf>,
    /// Upper bound on a single run.
    run_timeout: Duration,
}

impl PythonLoader {
    /// Create a loader.
    pub fn new(interpreter: Option<PathBuf>, run_timeout: Duration) -> Self {
        Self {
            interpreter,
            run_timeout,
        }
    }

    /// Create a loader from playground configuration.
    pub fn from_config(config: &PlaygroundConfig) -> Self {
        Self::new(config.python.clone(), config.run_timeout())
    }

    /// Resolve the interpreter path.
    ///
    /// Looks for, in order:
    /// 1. The configured path
    /// 2. `python3` on PATH
    /// 3. `python` on PATH
    fn locate(&self) -> Result<PathBuf> {
        if let Some(path) = &self.interpreter {
            if path.exists() {
                return Ok(path.clone());
            }
            // Bare names like "python3.12" are resolved through PATH.
            return which::which(path).map_err(|e| {
                Error::RuntimeLoad(format!("python interpreter '{}' not found: {}", path.display(), e))
            });
        }

        for name in ["python3", "python"] {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }

        Err(Error::RuntimeLoad(
            "no python3 or python interpreter found on PATH".to_string(),
        ))
    }
}

impl RuntimeLoader for PythonLoader {
    type Runtime = PythonRuntime;

    fn load(self) -> impl Future<Output = Result<PythonRuntime>> + Send {
        async move {
            let interpreter = self.locate()?;
            debug!("Probing python interpreter at {}", interpreter.display());

            let probe = Command::new(&interpreter)
                .arg("--version")
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(|e| {
                    Error::RuntimeLoad(format!(
                        "failed to start '{}': {}",
                        interpreter.display(),
                        e
                    ))
                })?;

            if !probe.status.success() {
                return Err(Error::RuntimeLoad(format!(
                    "'{} --version' exited with {}",
                    interpreter.display(),
                    probe.status
                )));
            }

            // Python 2 printed its version to stderr.
            let mut version = String::from_utf8_lossy(&probe.stdout).trim().to_string();
            if version.is_empty() {
                version = String::from_utf8_lossy(&probe.stderr).trim().to_string();
            }
            info!("Loaded {} from {}", version, interpreter.display());

            Ok(PythonRuntime {
                interpreter,
                version,
                run_timeout: self.run_timeout,
            })
        }
    }
}

/// A verified Python interpreter.
#[derive(Debug, Clone)]
pub struct PythonRuntime {
    interpreter: PathBuf,
    version: String,
    run_timeout: Duration,
}

impl PythonRuntime {
    /// Interpreter path.
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Version string reported by the interpreter, e.g. `Python 3.12.1`.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Runtime for PythonRuntime {
    fn run(&self, code: String) -> impl Future<Output = RunResult> + Send {
        let interpreter = self.interpreter.clone();
        let run_timeout = self.run_timeout;

        async move {
            let mut child = Command::new(&interpreter)
                .arg("-I")
                .arg("-")
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| format!("failed to start python: {}", e))?;

            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| "failed to open python stdin".to_string())?;
            stdin
                .write_all(code.as_bytes())
                .await
                .map_err(|e| format!("failed to send code to python: {}", e))?;
            // Closing stdin is what lets `python -` start executing.
            drop(stdin);

            let output = match tokio::time::timeout(run_timeout, child.wait_with_output()).await {
                Ok(result) => result.map_err(|e| format!("failed to wait for python: {}", e))?,
                Err(_) => {
                    return Err(format!(
                        "execution timed out after {} ms",
                        run_timeout.as_millis()
                    ));
                }
            };

            if output.status.success() {
                Ok(strip_trailing_newline(String::from_utf8_lossy(&output.stdout).into_owned()))
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if stderr.is_empty() {
                    Err(format!("python exited with {}", output.status))
                } else {
                    Err(stderr)
                }
            }
        }
    }
}

/// Drop one trailing line terminator (`\n` or `\r\n`).
fn strip_trailing_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}
