//! Inter-process communication with interpreter workers.
//!
//! This module provides the wire protocol, the launchers that start a
//! worker, and the handle used to submit runs and observe readiness.

mod launcher;
mod pending;
pub mod protocol;
mod worker;

pub use launcher::{InProcessLauncher, ProcessLauncher, WorkerLauncher, WorkerTransport};
pub use pending::Completion;
pub use protocol::{Event, Request, RequestId, read_message, write_message};
pub use worker::WorkerHandle;
