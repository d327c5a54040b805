//! What an operation (or a hook callback) gets to work with.

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::core::invocation::Invocation;
use crate::core::target::Target;
use crate::core::visibility::{Channel, Visibility};
use crate::engine::{Engine, Frame};
use crate::error::TaskResult;
use crate::io::output::Emphasis;
use crate::io::settings::SettingsProvider;

/// Per-run view of the engine: the task id, the visibility in effect and
/// whether messages are silenced.
#[derive(Clone)]
pub struct TaskContext<'a> {
    engine: &'a Engine,
    task_id: &'a str,
    visibility: Visibility,
    silent: bool,
    is_subtask: bool,
    depth: usize,
}

impl<'a> TaskContext<'a> {
    pub(crate) fn new(engine: &'a Engine, task_id: &'a str, frame: Frame, silent: bool) -> Self {
        Self {
            engine,
            task_id,
            visibility: frame.visibility,
            silent,
            is_subtask: frame.is_subtask,
            depth: frame.depth,
        }
    }

    pub fn task_id(&self) -> &str {
        self.task_id
    }

    pub fn is_subtask(&self) -> bool {
        self.is_subtask
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn settings(&self) -> &dyn SettingsProvider {
        self.engine.settings()
    }

    /// Informational message; dropped when the run is silent.
    pub fn log(&self, message: &str) {
        if !self.silent {
            self.engine.emit(message, Emphasis::Plain);
        }
    }

    /// Like [`log`](Self::log), emphasized.
    pub fn info(&self, message: &str) {
        if !self.silent {
            self.engine.emit(message, Emphasis::Bold);
        }
    }

    /// Always shown, even for silent runs.
    pub fn error(&self, message: &str) {
        self.engine.emit(message, Emphasis::Error);
    }

    /// Shown unless the `warnings` channel is hidden.
    pub fn warn(&self, message: &str) {
        if self.visibility.shows(Channel::Warnings) {
            self.engine.emit(&format!("Warning: {message}"), Emphasis::Error);
        }
    }

    /// Run `command` on `target` and return its stdout without the trailing
    /// newline. The command echo and its output go through the `running`,
    /// `stdout` and `stderr` channels.
    pub fn run(&self, target: Target, command: &str) -> Result<String> {
        if self.visibility.shows(Channel::Running) {
            self.engine
                .emit(&format!("[{target}] run: {command}"), Emphasis::Plain);
        }
        let output = self
            .engine
            .executor()
            .run(target, command)
            .with_context(|| format!("[{target}] {command}"))?;
        if self.visibility.shows(Channel::Stdout) {
            for line in output.stdout.lines() {
                self.engine
                    .emit(&format!("[{target}] out: {line}"), Emphasis::Plain);
            }
        }
        if self.visibility.shows(Channel::Stderr) {
            for line in output.stderr.lines() {
                self.engine
                    .emit(&format!("[{target}] err: {line}"), Emphasis::Plain);
            }
        }
        Ok(output.stdout.trim_end_matches(['\n', '\r']).to_string())
    }

    pub fn run_local(&self, command: &str) -> Result<String> {
        self.run(Target::Local, command)
    }

    pub fn run_remote(&self, command: &str) -> Result<String> {
        self.run(Target::Remote, command)
    }

    /// Copy `source` on `from` to `destination` on the other target.
    pub fn copy(&self, from: Target, source: &str, destination: &str) -> Result<()> {
        if self.visibility.shows(Channel::Running) {
            self.engine.emit(
                &format!("[{from}] copy: {source} -> {}:{destination}", from.reverse()),
                Emphasis::Plain,
            );
        }
        self.engine
            .executor()
            .copy(from, source, destination)
            .with_context(|| format!("copy {from}:{source} to {}:{destination}", from.reverse()))
    }

    /// Working directory configured for `target` under `[paths]`.
    pub fn target_path(&self, target: Target) -> Result<&str> {
        self.settings()
            .target_path(target)
            .ok_or_else(|| anyhow!("no path configured for target {target} (set paths.{target})"))
    }

    /// Run another task as a subtask of this one: no introduction, no
    /// prompt, silent unless asked otherwise, and starting from this run's
    /// visibility.
    pub fn subtask(&self, task_id: &str, invocation: Invocation) -> TaskResult<Value> {
        let frame = Frame {
            visibility: self.visibility.clone(),
            is_subtask: true,
            depth: self.depth + 1,
        };
        self.engine.run_frame(task_id, invocation, frame)
    }

    /// Run `f` with `hide` then `show` applied on top of the current
    /// visibility. Leaving the closure restores it.
    pub fn scoped<R>(&self, hide: &[Channel], show: &[Channel], f: impl FnOnce(&Self) -> R) -> R {
        let scoped = Self {
            visibility: self.visibility.nested(hide, show),
            ..self.clone()
        };
        f(&scoped)
    }

    /// Hooks see every channel and ignore the task's `silent` flag.
    pub(crate) fn for_hooks(&self) -> Self {
        Self {
            visibility: Visibility::everything(),
            silent: false,
            ..self.clone()
        }
    }
}
