//! Output sink that streams straight to the terminal.

use scribble_core::OutputSink;
use scribble_core::execute::FAILURE_PREFIX;

use crate::colors;

/// Prints chunks as they arrive. The terminal can't be cleared
/// retroactively, so `clear` is a no-op.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl OutputSink for TerminalSink {
    fn clear(&self) {}

    fn append(&self, chunk: &str) {
        if chunk.starts_with(FAILURE_PREFIX) {
            print!("{}{}{}", colors::RED, chunk, colors::RESET);
        } else {
            print!("{}", chunk);
        }
        if !chunk.ends_with('\n') {
            println!();
        }
        colors::flush_stdout();
    }

    fn mount(&self, mount_id: &str, html: &str) {
        println!("{}#{}{} {}", colors::DIM, mount_id, colors::RESET, html);
        colors::flush_stdout();
    }
}
