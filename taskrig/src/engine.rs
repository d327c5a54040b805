//! Drives one task run through its lifecycle: control options, validation,
//! capability gates, the operation itself and post-run hooks.

use anyhow::anyhow;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::context::TaskContext;
use crate::core::args::Args;
use crate::core::invocation::{ControlOptions, Invocation, Origin};
use crate::core::types::Phase;
use crate::core::validator::{bind_trusted, validate};
use crate::core::visibility::{Channel, Visibility};
use crate::error::{HookError, SchemaError, TaskError, TaskResult};
use crate::hooks::{Hook, HookRegistry};
use crate::io::confirm::Confirmer;
use crate::io::executor::TargetExecutor;
use crate::io::output::{Emphasis, OutputSink};
use crate::io::settings::SettingsProvider;
use crate::task::registry::{RegisteredTask, TaskRegistry};
use crate::task::usage::{render_launch, render_usage};
use crate::task::{Gate, GateOutcome, Task};

/// Nested subtask calls deeper than this fail instead of overflowing.
pub const MAX_SUBTASK_DEPTH: usize = 32;

/// Where a run sits relative to its callers.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub visibility: Visibility,
    pub is_subtask: bool,
    pub depth: usize,
}

impl Frame {
    fn root() -> Self {
        Self {
            visibility: Visibility::everything(),
            is_subtask: false,
            depth: 0,
        }
    }
}

/// Records phase transitions of one run and refuses illegal ones.
struct Lifecycle<'a> {
    task_id: &'a str,
    phase: Phase,
}

impl<'a> Lifecycle<'a> {
    fn new(task_id: &'a str) -> Self {
        Self {
            task_id,
            phase: Phase::Created,
        }
    }

    fn advance(&mut self, next: Phase) -> TaskResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(TaskError::operation(anyhow!(
                "illegal lifecycle transition for {}: {} -> {}",
                self.task_id,
                self.phase.as_str(),
                next.as_str()
            )));
        }
        debug!(task_id = self.task_id, from = self.phase.as_str(), phase = next.as_str(), "phase");
        self.phase = next;
        Ok(())
    }

    /// Move to `Failed` when that is still possible and hand `err` back.
    fn fail(&mut self, err: TaskError) -> TaskError {
        if self.phase.can_transition_to(Phase::Failed) {
            self.phase = Phase::Failed;
            debug!(task_id = self.task_id, phase = "failed", error = %err, "phase");
        }
        err
    }
}

/// Task registry plus the collaborators every run goes through.
pub struct Engine {
    settings: Box<dyn SettingsProvider>,
    executor: Box<dyn TargetExecutor>,
    confirmer: Box<dyn Confirmer>,
    sink: Box<dyn OutputSink>,
    tasks: TaskRegistry,
    hooks: HookRegistry,
}

impl Engine {
    /// An engine with no tasks and the built-in hook callbacks.
    pub fn new(
        settings: impl SettingsProvider + 'static,
        executor: impl TargetExecutor + 'static,
        confirmer: impl Confirmer + 'static,
        sink: impl OutputSink + 'static,
    ) -> Self {
        Self {
            settings: Box::new(settings),
            executor: Box::new(executor),
            confirmer: Box::new(confirmer),
            sink: Box::new(sink),
            tasks: TaskRegistry::new(),
            hooks: HookRegistry::with_builtins(),
        }
    }

    pub fn register(&mut self, task: impl Task + 'static) -> Result<(), SchemaError> {
        self.tasks.register(Box::new(task))
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    pub fn settings(&self) -> &dyn SettingsProvider {
        self.settings.as_ref()
    }

    pub(crate) fn executor(&self) -> &dyn TargetExecutor {
        self.executor.as_ref()
    }

    pub(crate) fn emit(&self, message: &str, emphasis: Emphasis) {
        self.sink.emit(message, emphasis);
    }

    /// Usage text of a registered task.
    pub fn usage(&self, task_id: &str) -> TaskResult<String> {
        let entry = self.entry(task_id)?;
        usage_of(entry).map_err(TaskError::Operation)
    }

    /// Run `task_id` as a top-level task.
    pub fn run(&self, task_id: &str, invocation: Invocation) -> TaskResult<Value> {
        self.run_frame(task_id, invocation, Frame::root())
    }

    fn entry(&self, task_id: &str) -> TaskResult<&RegisteredTask> {
        self.tasks.get(task_id).ok_or_else(|| TaskError::UnknownTask {
            id: task_id.to_string(),
        })
    }

    #[instrument(skip_all, fields(task_id = %task_id, depth = frame.depth, subtask = frame.is_subtask))]
    pub(crate) fn run_frame(
        &self,
        task_id: &str,
        mut invocation: Invocation,
        frame: Frame,
    ) -> TaskResult<Value> {
        let entry = self.entry(task_id)?;
        if frame.depth > MAX_SUBTASK_DEPTH {
            return Err(TaskError::operation(anyhow!(
                "subtask nesting deeper than {MAX_SUBTASK_DEPTH} levels at {task_id}"
            )));
        }
        let task = entry.task.as_ref();
        let mut lifecycle = Lifecycle::new(task_id);

        // Only the dispatcher speaks for the command line.
        if frame.is_subtask && invocation.origin == Origin::CommandLine {
            invocation.origin = Origin::Programmatic;
        }

        if !frame.is_subtask && invocation.is_help() {
            let usage = usage_of(entry).map_err(|err| lifecycle.fail(TaskError::Operation(err)))?;
            self.emit(&usage, Emphasis::Plain);
            lifecycle.advance(Phase::Done)?;
            return Ok(Value::Null);
        }

        let reserved: Vec<&str> = entry.control_keys.iter().map(|key| key.name).collect();
        let controls = ControlOptions::extract(&mut invocation.named, &reserved)
            .map_err(|err| lifecycle.fail(err.into()))?;
        lifecycle.advance(Phase::Configured)?;

        let is_subtask = frame.is_subtask || controls.subtask;
        let silent = controls.silent.unwrap_or(is_subtask);

        let bound = if invocation.origin.validates() {
            validate(&entry.schema, &invocation.positional, &invocation.named)
        } else {
            bind_trusted(&entry.schema, &invocation.positional, &invocation.named)
        };
        let args = bound.map_err(|err| lifecycle.fail(err.into()))?;
        debug!(task_id, origin = ?invocation.origin, arguments = args.len(), "arguments bound");

        if !is_subtask && !silent {
            let intro = render_launch(task.description(), &args)
                .map_err(|err| lifecycle.fail(TaskError::Operation(err)))?;
            self.emit(&intro, Emphasis::Plain);
        }

        self.run_gates(task, task_id, &args, &controls, is_subtask, &mut lifecycle)?;

        if !is_subtask
            && !silent
            && let Some(message) = task.start_message()
        {
            self.emit(&format!("{}...", capitalize(&message)), Emphasis::Bold);
        }

        lifecycle.advance(Phase::Executing)?;
        let mut hidden = task.hidden_channels(is_subtask);
        hidden.extend(controls.hide.iter().flatten().copied());
        let shown: Vec<Channel> = controls.show.unwrap_or_default();
        let operation_frame = Frame {
            visibility: frame.visibility.nested(&hidden, &shown),
            is_subtask,
            depth: frame.depth,
        };
        let ctx = TaskContext::new(self, task_id, operation_frame, silent);
        let value = task
            .operation(&ctx, &args)
            .map_err(|err| lifecycle.fail(TaskError::Operation(err)))?;

        let hooks = self
            .collect_hooks(task, task_id, &args)
            .map_err(|err| lifecycle.fail(err.into()))?;
        let hook_ctx = ctx.for_hooks();
        for hook in &hooks {
            hook_ctx.log(&format!("Triggering {task_id} hook: {}...", hook.name()));
            hook.invoke(&hook_ctx).map_err(|err| {
                lifecycle.fail(TaskError::Operation(
                    err.context(format!("{task_id} hook {} failed", hook.name())),
                ))
            })?;
        }
        lifecycle.advance(Phase::HooksDispatched)?;
        lifecycle.advance(Phase::Done)?;
        info!(task_id, hooks = hooks.len(), "task done");
        Ok(value)
    }

    /// Each capability's `before_execute`: plain checks first, then the
    /// prompting ones, each group in composition order.
    fn run_gates(
        &self,
        task: &dyn Task,
        task_id: &str,
        args: &Args,
        controls: &ControlOptions,
        is_subtask: bool,
        lifecycle: &mut Lifecycle<'_>,
    ) -> TaskResult<()> {
        let gate = Gate {
            task_id,
            args,
            controls,
            is_subtask,
            confirmer: self.confirmer.as_ref(),
        };
        let (prompting, checks): (Vec<_>, Vec<_>) = task
            .capabilities()
            .into_iter()
            .partition(|capability| capability.prompts());
        for capability in checks.into_iter().chain(prompting) {
            match capability.before_execute(&gate) {
                Ok(GateOutcome::Passed) => {}
                Ok(GateOutcome::Confirmed { prompted }) => {
                    lifecycle.advance(Phase::ConfirmPending)?;
                    lifecycle.advance(Phase::Confirmed)?;
                    debug!(task_id, prompted, "confirmed");
                }
                Err(err @ TaskError::Confirmation(_)) => {
                    lifecycle.advance(Phase::ConfirmPending)?;
                    lifecycle.advance(Phase::Aborted)?;
                    return Err(err);
                }
                Err(err) => return Err(lifecycle.fail(err)),
            }
        }
        Ok(())
    }

    /// Global hooks first, then those scoped by capabilities (the target).
    fn collect_hooks(
        &self,
        task: &dyn Task,
        task_id: &str,
        args: &Args,
    ) -> Result<Vec<Hook<'_>>, HookError> {
        let settings = self.settings();
        let mut hooks = self.hooks.lookup_global(settings, task_id)?;
        for capability in task.capabilities() {
            if let Some(scope) = capability.hook_scope(args) {
                hooks.extend(self.hooks.lookup_scoped(settings, task_id, &scope)?);
            }
        }
        Ok(hooks)
    }
}

fn usage_of(entry: &RegisteredTask) -> anyhow::Result<String> {
    let task = entry.task.as_ref();
    render_usage(
        &task.task_id(),
        task.description(),
        &entry.schema,
        &entry.control_keys,
    )
}

/// First letter upper-cased, the rest lower-cased.
fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
