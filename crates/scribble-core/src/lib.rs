//! Core engine for the Scribble multi-language playground.
//!
//! This crate provides:
//! - Session and worker lifecycle management
//! - Execution dispatch for python, javascript and react
//! - The newline-delimited JSON protocol spoken with interpreter workers
//! - The interpreter worker bootstrap and its Python runtime
//! - JSX lowering for the react strategy

pub mod compile;
pub mod config;
pub mod error;
pub mod execute;
pub mod interpreter;
pub mod ipc;
pub mod language;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::{OverlapPolicy, PlaygroundConfig};
pub use error::{Error, Result};
pub use execute::{
    Capability, Dispatcher, ExecutionStrategy, Failure, OutputBuffer, OutputSink, PendingRun,
    RunOutcome, SharedSink,
};
pub use interpreter::{PythonLoader, RuntimeLoader, serve};
pub use ipc::{InProcessLauncher, ProcessLauncher, WorkerHandle, WorkerLauncher};
pub use language::{ExecutionRequest, Language, LanguageTag};
pub use session::Session;
