//! Output sink for product messages (task descriptions, command echo, hooks).
//!
//! Unlike `tracing`, this output is part of what the user asked for and is
//! not controlled by `RUST_LOG`.

use std::io::Write;

/// Emphasis hint attached to a message. Sinks may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Plain,
    Bold,
    Error,
}

/// Fire-and-forget message sink. Never gates control flow.
pub trait OutputSink {
    fn emit(&self, message: &str, emphasis: Emphasis);
}

/// Writes to stdout, errors to stderr.
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn emit(&self, message: &str, emphasis: Emphasis) {
        // Write failures (closed pipe) are ignored.
        let _ = match emphasis {
            Emphasis::Error => writeln!(std::io::stderr().lock(), "{message}"),
            Emphasis::Plain | Emphasis::Bold => writeln!(std::io::stdout().lock(), "{message}"),
        };
    }
}
