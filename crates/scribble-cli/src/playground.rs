//! Shared setup for commands that execute code.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scribble_core::{
    Dispatcher, InProcessLauncher, PlaygroundConfig, ProcessLauncher, PythonLoader, Session,
    SharedSink,
};
use tracing::debug;

/// Flags shared by `run` and `repl`.
#[derive(Debug, Clone, Default)]
pub struct PlaygroundArgs {
    pub in_process: bool,
    pub config: Option<PathBuf>,
    pub python: Option<PathBuf>,
}

/// Configuration with the command-line layer applied on top.
pub fn load_config(args: &PlaygroundArgs) -> anyhow::Result<PlaygroundConfig> {
    let mut config = PlaygroundConfig::load(args.config.as_deref())?;
    if let Some(python) = &args.python {
        config.python = Some(python.clone());
    }
    debug!(?config, "Configuration loaded");
    Ok(config)
}

/// A session whose worker runs as a child process, or in this process
/// when `in_process` is set.
pub fn session(config: &PlaygroundConfig, in_process: bool) -> Session {
    if in_process {
        Session::new(InProcessLauncher::new(PythonLoader::from_config(config)))
    } else {
        Session::new(ProcessLauncher::from_config(config))
    }
}

/// Start a session and mount a dispatcher writing to `sink`.
pub fn mount(config: &PlaygroundConfig, in_process: bool, sink: SharedSink) -> Dispatcher {
    Dispatcher::mount(Arc::new(session(config, in_process)), sink, config)
}

/// Display name for a file path in messages.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
