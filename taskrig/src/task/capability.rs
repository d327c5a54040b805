//! Capabilities a task can compose: each contributes argument specs,
//! reserved control keys and a `before_execute` step.

use crate::core::args::Args;
use crate::core::argument::{ArgumentSpec, check, display_raw, to_bool};
use crate::core::invocation::ControlOptions;
use crate::core::target::Target;
use crate::error::{ConfirmError, TaskError, TaskResult, ValidationError};
use crate::io::confirm::Confirmer;

/// A reserved named key consumed before validation, with its usage helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlKey {
    pub name: &'static str,
    pub helper: &'static str,
}

/// What a capability sees right before the operation runs.
pub struct Gate<'a> {
    pub task_id: &'a str,
    pub args: &'a Args,
    pub controls: &'a ControlOptions,
    pub is_subtask: bool,
    pub confirmer: &'a dyn Confirmer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Nothing to confirm.
    Passed,
    /// Confirmed, either up front with `confirm=` or by answering the prompt.
    Confirmed { prompted: bool },
}

pub trait Capability {
    fn name(&self) -> &'static str;

    fn arguments(&self) -> Vec<ArgumentSpec> {
        Vec::new()
    }

    fn control_keys(&self) -> &'static [ControlKey] {
        &[]
    }

    /// Whether `before_execute` may ask the user something. Prompting
    /// capabilities run after every non-prompting one.
    fn prompts(&self) -> bool {
        false
    }

    /// Runs after validation, before the operation. An error stops the run.
    fn before_execute(&self, gate: &Gate<'_>) -> TaskResult<GateOutcome> {
        let _ = gate;
        Ok(GateOutcome::Passed)
    }

    /// Extra hook scope this capability adds for a run (e.g. the target).
    fn hook_scope(&self, args: &Args) -> Option<String> {
        let _ = args;
        None
    }
}

pub const CONFIRM: &str = "confirm";

const CONFIRM_KEYS: &[ControlKey] = &[ControlKey {
    name: CONFIRM,
    helper: "yes|y|1",
}];

/// Requires an explicit yes before a top-level run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmGate {
    pub message: &'static str,
    pub choice: &'static str,
    /// Answer used when the user just hits enter.
    pub default: bool,
}

impl ConfirmGate {
    pub const fn new(message: &'static str) -> Self {
        Self {
            message,
            choice: "Do you want to continue?",
            default: false,
        }
    }

    pub fn question(&self) -> String {
        format!("{}{}", self.message, self.choice)
    }
}

impl Default for ConfirmGate {
    fn default() -> Self {
        Self::new("This is an important choice. ")
    }
}

impl Capability for ConfirmGate {
    fn prompts(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "confirm"
    }

    fn control_keys(&self) -> &'static [ControlKey] {
        CONFIRM_KEYS
    }

    fn before_execute(&self, gate: &Gate<'_>) -> TaskResult<GateOutcome> {
        // Subtasks never prompt and never look at `confirm`.
        if gate.is_subtask {
            return Ok(GateOutcome::Passed);
        }

        let confirmed = match gate.controls.extra.get(CONFIRM) {
            Some(raw) => to_bool(raw).map_err(|raw| ConfirmError::NotBoolean { raw })?,
            None => false,
        };
        if confirmed {
            return Ok(GateOutcome::Confirmed { prompted: false });
        }

        let answer = gate
            .confirmer
            .confirm(&self.question(), self.default)
            .map_err(TaskError::Operation)?;
        if answer {
            Ok(GateOutcome::Confirmed { prompted: true })
        } else {
            Err(ConfirmError::Declined.into())
        }
    }
}

/// Adds the mandatory `target` argument and target-scoped hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetCapability;

impl TargetCapability {
    pub fn spec() -> ArgumentSpec {
        ArgumentSpec::required("target", "local|remote").checker(check::target)
    }
}

impl Capability for TargetCapability {
    fn name(&self) -> &'static str {
        "target"
    }

    fn arguments(&self) -> Vec<ArgumentSpec> {
        vec![Self::spec()]
    }

    /// Re-resolve the target so trusted invocations cannot smuggle in
    /// anything outside `{local, remote}`.
    fn before_execute(&self, gate: &Gate<'_>) -> TaskResult<GateOutcome> {
        let raw = gate.args.get("target");
        if raw.and_then(Target::from_value).is_none() {
            return Err(ValidationError::InvalidArgumentValue {
                name: "target".to_string(),
                raw: raw.map(display_raw).unwrap_or_default(),
                helper: "local|remote".to_string(),
            }
            .into());
        }
        Ok(GateOutcome::Passed)
    }

    fn hook_scope(&self, args: &Args) -> Option<String> {
        args.get("target")
            .and_then(Target::from_value)
            .map(|t| t.as_str().to_string())
    }
}
