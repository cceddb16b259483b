//! Playground configuration.
//!
//! Layered as: defaults, then an optional JSON file, then `SCRIBBLE_*`
//! environment variables. Front ends apply their own flags last.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default React mount point id.
pub const DEFAULT_MOUNT_ID: &str = "react-mount";

/// What to do with a worker run while another one is still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Send it anyway; each result is attributed to its own run by id.
    #[default]
    Interleave,
    /// Refuse the new run until the pending one finishes.
    Reject,
}

impl FromStr for OverlapPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interleave" => Ok(Self::Interleave),
            "reject" => Ok(Self::Reject),
            other => Err(Error::Config(format!(
                "unknown overlap policy '{}' (expected 'interleave' or 'reject')",
                other
            ))),
        }
    }
}

/// Settings shared by the dispatcher, the worker launcher and the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Explicit path to the `scribble-worker` binary.
    pub worker_path: Option<PathBuf>,
    /// Explicit Python interpreter for the worker.
    pub python: Option<PathBuf>,
    /// Upper bound on a single worker run, in milliseconds.
    pub run_timeout_ms: u64,
    /// How long front ends wait for the worker to become ready.
    pub ready_timeout_ms: u64,
    /// Behavior for overlapping worker runs.
    pub overlap: OverlapPolicy,
    /// Element id React output mounts into.
    pub mount_id: String,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            worker_path: None,
            python: None,
            run_timeout_ms: 30_000,
            ready_timeout_ms: 30_000,
            overlap: OverlapPolicy::default(),
            mount_id: DEFAULT_MOUNT_ID.to_string(),
        }
    }
}

impl PlaygroundConfig {
    pub const ENV_WORKER_PATH: &'static str = "SCRIBBLE_WORKER_PATH";
    pub const ENV_PYTHON: &'static str = "SCRIBBLE_PYTHON";
    pub const ENV_RUN_TIMEOUT_MS: &'static str = "SCRIBBLE_RUN_TIMEOUT_MS";
    pub const ENV_READY_TIMEOUT_MS: &'static str = "SCRIBBLE_READY_TIMEOUT_MS";
    pub const ENV_OVERLAP: &'static str = "SCRIBBLE_OVERLAP";
    pub const ENV_MOUNT_ID: &'static str = "SCRIBBLE_MOUNT_ID";

    /// Load configuration.
    ///
    /// Uses `path` if given, otherwise `<config dir>/scribble/config.json`
    /// when that file exists, then applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Location of the per-user configuration file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scribble").join("config.json"))
    }

    /// Read a JSON configuration file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Override fields from environment variables looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(Self::ENV_WORKER_PATH) {
            self.worker_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(Self::ENV_PYTHON) {
            self.python = Some(PathBuf::from(path));
        }
        if let Some(ms) = lookup(Self::ENV_RUN_TIMEOUT_MS) {
            self.run_timeout_ms = parse_millis(Self::ENV_RUN_TIMEOUT_MS, &ms)?;
        }
        if let Some(ms) = lookup(Self::ENV_READY_TIMEOUT_MS) {
            self.ready_timeout_ms = parse_millis(Self::ENV_READY_TIMEOUT_MS, &ms)?;
        }
        if let Some(policy) = lookup(Self::ENV_OVERLAP) {
            self.overlap = policy.parse()?;
        }
        if let Some(id) = lookup(Self::ENV_MOUNT_ID) {
            self.mount_id = id;
        }
        Ok(())
    }

    /// Environment a spawned worker needs to rebuild its part of this config.
    pub fn worker_env(&self) -> Vec<(&'static str, String)> {
        let mut env = vec![(Self::ENV_RUN_TIMEOUT_MS, self.run_timeout_ms.to_string())];
        if let Some(python) = &self.python {
            env.push((Self::ENV_PYTHON, python.display().to_string()));
        }
        env
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number of milliseconds, got '{}'", key, value)))
}
