//! Command-line dispatch: parse task strings, run them in order and turn
//! failures into exit codes. This is the only place a failure becomes an
//! exit code.

use anyhow::{Context, Result};
use tracing::debug;

use crate::builtin::register_all;
use crate::core::command_line::parse_task_call;
use crate::engine::Engine;
use crate::error::{ConfirmError, TaskError};
use crate::exit_codes;
use crate::io::confirm::TerminalConfirmer;
use crate::io::executor::ShellExecutor;
use crate::io::output::{ConsoleSink, Emphasis};
use crate::io::settings::Settings;

/// Engine wired to the shell, the terminal and the console, with the
/// built-in tasks registered.
pub fn default_engine(settings: Settings) -> Result<Engine> {
    let executor = ShellExecutor::from_settings(&settings);
    let mut engine = Engine::new(settings, executor, TerminalConfirmer, ConsoleSink);
    register_all(&mut engine).context("register built-in tasks")?;
    Ok(engine)
}

/// Run each `<task>[:<args>]` string in order, stopping at the first
/// failure. Returns the exit code.
pub fn run_task_strings(engine: &Engine, tasks: &[String]) -> i32 {
    for raw in tasks {
        let call = match parse_task_call(raw) {
            Ok(call) => call,
            Err(err) => {
                engine.emit(
                    &format!("\nThe task was called incorrectly:\n\n\t{err}.\n"),
                    Emphasis::Error,
                );
                return exit_codes::INVALID;
            }
        };
        debug!(task_id = %call.task_id, "dispatching");
        if let Err(err) = engine.run(&call.task_id, call.invocation) {
            return report_failure(engine, &call.task_id, &err);
        }
    }
    exit_codes::OK
}

/// Print what went wrong with a command-line run and pick the exit code.
pub fn report_failure(engine: &Engine, task_id: &str, err: &TaskError) -> i32 {
    match err {
        TaskError::Validation(_) | TaskError::Confirmation(ConfirmError::NotBoolean { .. }) => {
            engine.emit(
                &format!(
                    "\nThe task was called incorrectly:\n\n\t{err}.\n\nPlease refer to task usage:"
                ),
                Emphasis::Error,
            );
            if let Ok(usage) = engine.usage(task_id) {
                engine.emit(&usage, Emphasis::Plain);
            }
            exit_codes::INVALID
        }
        TaskError::Confirmation(ConfirmError::Declined) => {
            engine.emit("Cancelling task...", Emphasis::Error);
            exit_codes::ABORTED
        }
        TaskError::UnknownTask { .. } => {
            engine.emit(
                &format!("{err} (see `taskrig list`)"),
                Emphasis::Error,
            );
            exit_codes::INVALID
        }
        TaskError::Operation(source) => {
            engine.emit(&format!("{task_id} failed: {source:#}"), Emphasis::Error);
            exit_codes::FAILED
        }
    }
}
