//! In-process JavaScript evaluation on an embedded engine.

use boa_engine::{Context, JsError, Source};
use tracing::debug;

use super::output::{Failure, SharedSink};
use super::strategy::{Capability, ExecutionStrategy, RunOutcome};

/// Shown when a script completes without a printable value.
pub const JS_PLACEHOLDER: &str = "✅ JS executed";

const CONSOLE_SHIM: &str = include_str!("js/console.js");

/// Result of one evaluation: captured console lines and the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation<T> {
    /// Console output, one line per call, without a trailing newline.
    pub console: String,
    pub outcome: std::result::Result<T, Failure>,
}

impl<T> Evaluation<T> {
    pub(crate) fn failed(failure: Failure) -> Self {
        Self {
            console: String::new(),
            outcome: Err(failure),
        }
    }

    /// Append the console block, if any, as its own chunk.
    pub(crate) fn append_console(&self, sink: &SharedSink) {
        if !self.console.is_empty() {
            sink.append(&format!("{}\n", self.console));
        }
    }
}

/// Evaluates JavaScript synchronously on the caller's thread.
#[derive(Debug, Default)]
pub struct InProcessStrategy;

impl ExecutionStrategy for InProcessStrategy {
    fn capability(&self) -> Capability {
        Capability::InProcess
    }

    fn execute(&self, source: &str, sink: &SharedSink) -> RunOutcome {
        let evaluation = evaluate(source);
        evaluation.append_console(sink);
        match &evaluation.outcome {
            Ok(text) => sink.append(text),
            Err(failure) => sink.append(&failure.render()),
        }
        RunOutcome::Completed
    }
}

/// Evaluate `source` as a script in a fresh context.
///
/// The result is the string conversion of the completion value, or the
/// placeholder when that value is `undefined`, `null` or empty.
pub fn evaluate(source: &str) -> Evaluation<String> {
    let mut context = match new_context() {
        Ok(context) => context,
        Err(failure) => return Evaluation::failed(failure),
    };

    let outcome = context
        .eval(Source::from_bytes(source))
        .and_then(|value| {
            if value.is_null_or_undefined() {
                return Ok(String::new());
            }
            value
                .to_string(&mut context)
                .map(|text| text.to_std_string_escaped())
        })
        .map(|text| {
            if text.is_empty() {
                JS_PLACEHOLDER.to_string()
            } else {
                text
            }
        })
        .map_err(|e| runtime_failure(&e, &mut context));

    debug!(ok = outcome.is_ok(), "JavaScript evaluated");
    Evaluation {
        console: drain_console(&mut context),
        outcome,
    }
}

/// A fresh engine context with console capture installed.
pub(crate) fn new_context() -> std::result::Result<Context, Failure> {
    let mut context = Context::default();
    context
        .eval(Source::from_bytes(CONSOLE_SHIM))
        .map_err(|e| runtime_failure(&e, &mut context))?;
    Ok(context)
}

/// Take the console lines captured so far.
pub(crate) fn drain_console(context: &mut Context) -> String {
    context
        .eval(Source::from_bytes("__scribbleConsole.drain()"))
        .ok()
        .and_then(|value| value.as_string().map(|s| s.to_std_string_escaped()))
        .unwrap_or_default()
}

/// Turn a thrown value into a runtime failure with a readable message.
pub(crate) fn runtime_failure(error: &JsError, context: &mut Context) -> Failure {
    let message = match error.try_native(context) {
        Ok(native) => native.to_string(),
        Err(_) => error.to_string(),
    };
    if message.trim().is_empty() {
        Failure::Runtime("Unknown error".to_string())
    } else {
        Failure::Runtime(message)
    }
}
