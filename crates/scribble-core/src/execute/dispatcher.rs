//! Picks a strategy per language and runs requests through it.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::isolated::IsolatedStrategy;
use super::javascript::InProcessStrategy;
use super::output::{Failure, SharedSink};
use super::react::CompileAndMountStrategy;
use super::strategy::{Capability, ExecutionStrategy, RunOutcome};
use crate::config::PlaygroundConfig;
use crate::language::{ExecutionRequest, Language};
use crate::session::Session;

/// Capability used for `language`.
pub fn capability_for(language: Language) -> Capability {
    match language {
        Language::Python => Capability::Isolated,
        Language::JavaScript => Capability::InProcess,
        Language::React => Capability::CompileAndMount,
    }
}

/// Execution dispatcher for one editor surface.
pub struct Dispatcher {
    session: Arc<Session>,
    sink: SharedSink,
    isolated: IsolatedStrategy,
    in_process: InProcessStrategy,
    compile_and_mount: CompileAndMountStrategy,
}

impl Dispatcher {
    /// Attach to `session`, acquiring its worker.
    ///
    /// A worker that cannot be constructed is reported to `sink` once;
    /// in-process languages keep working. Must be called from within a
    /// Tokio runtime.
    pub fn mount(session: Arc<Session>, sink: SharedSink, config: &PlaygroundConfig) -> Self {
        let worker = match session.acquire() {
            Ok(worker) => Ok(worker),
            Err(e) => {
                error!(session = %session.id(), "Interpreter worker unavailable: {}", e);
                let message = e.to_string();
                sink.append(&Failure::WorkerUnavailable(message.clone()).render());
                Err(message)
            }
        };
        info!(session = %session.id(), overlap = ?config.overlap, "Dispatcher mounted");

        Self {
            session,
            sink,
            isolated: IsolatedStrategy::new(worker, config.overlap),
            in_process: InProcessStrategy,
            compile_and_mount: CompileAndMountStrategy::new(config.mount_id.clone()),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// The strategy that runs `language`.
    pub fn strategy(&self, language: Language) -> &dyn ExecutionStrategy {
        match capability_for(language) {
            Capability::Isolated => &self.isolated,
            Capability::InProcess => &self.in_process,
            Capability::CompileAndMount => &self.compile_and_mount,
        }
    }

    /// Run `request`, reporting everything through the sink.
    ///
    /// The sink is cleared first. Returns immediately for worker and JSX
    /// runs; javascript blocks the caller until evaluation finishes.
    pub fn run(&self, request: ExecutionRequest) -> RunOutcome {
        self.sink.clear();

        let Some(language) = request.language.language() else {
            info!(tag = %request.language, "Language not supported");
            self.sink.append(&Failure::Unsupported.render());
            return RunOutcome::Completed;
        };

        let strategy = self.strategy(language);
        debug!(
            session = %self.session.id(),
            %language,
            capability = ?strategy.capability(),
            bytes = request.source.len(),
            "Dispatching run"
        );
        strategy.execute(&request.source, &self.sink)
    }
}
