//! Execution dispatch.
//!
//! The dispatcher maps a language tag to one of three strategies and pushes
//! all output, including failures, into an `OutputSink`:
//!
//! ```text
//!   ExecutionRequest ─▶ Dispatcher ─┬─ python     ─▶ IsolatedStrategy ─▶ worker ─▶ sink (later)
//!                                   ├─ javascript ─▶ InProcessStrategy ─────────▶ sink (now)
//!                                   └─ react      ─▶ CompileAndMountStrategy ───▶ mount + sink (later)
//! ```

mod dispatcher;
mod isolated;
mod javascript;
mod markup;
mod output;
mod react;
mod strategy;

pub use dispatcher::{Dispatcher, capability_for};
pub use isolated::IsolatedStrategy;
pub use javascript::{Evaluation, InProcessStrategy, JS_PLACEHOLDER, evaluate};
pub use output::{FAILURE_PREFIX, Failure, OutputBuffer, OutputSink, SharedSink};
pub use react::{CompileAndMountStrategy, REACT_PLACEHOLDER, render};
pub use strategy::{Capability, ExecutionStrategy, PendingRun, RunOutcome};
