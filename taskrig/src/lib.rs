//! Parameterized shell tasks for a local and a remote target.
//!
//! A task declares its arguments and composes capabilities (confirmation,
//! target selection). The engine validates each invocation against the
//! merged schema, runs capability gates, executes the operation with the
//! requested output visibility and dispatches hooks configured in settings.
//!
//! - **[`core`]**: pure logic (argument schemas, validation, task-string
//!   parsing, visibility, lifecycle phases). No I/O.
//! - **[`io`]**: side-effecting collaborators (settings file, child
//!   processes, target executor, prompts, console output). Traits at these
//!   seams let tests substitute scripted versions.
//!
//! [`engine`], [`context`], [`hooks`] and [`cli`] coordinate the two;
//! [`builtin`] holds the tasks registered by default.

pub mod builtin;
pub mod cli;
pub mod context;
pub mod core;
pub mod engine;
pub mod error;
pub mod exit_codes;
pub mod hooks;
pub mod io;
pub mod logging;
pub mod task;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
