//! The task abstraction and the capabilities tasks compose.
//!
//! A task declares an identity, its own arguments and the capabilities it
//! composes (in order). Everything else, from validation to hook dispatch,
//! is driven by the [`Engine`](crate::engine::Engine).

pub mod capability;
pub mod registry;
pub mod usage;

use anyhow::Result;
use serde_json::Value;

use crate::context::TaskContext;
use crate::core::args::Args;
use crate::core::argument::{ArgumentSpec, Schema};
use crate::core::visibility::Channel;

pub use capability::{Capability, ConfirmGate, ControlKey, Gate, GateOutcome, TargetCapability};

/// A parameterized operation invocable from the command line or from
/// another task.
pub trait Task {
    /// Module-like namespace, the part before the dot in the task id.
    fn namespace(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// Free text shown in usage and in the introductory message. The first
    /// line doubles as the summary in `taskrig list`.
    fn description(&self) -> &'static str;

    /// Stable identifier, also the hook lookup key.
    fn task_id(&self) -> String {
        format!("{}.{}", self.namespace(), self.name())
    }

    /// Composed capabilities, in composition order.
    fn capabilities(&self) -> Vec<&dyn Capability> {
        Vec::new()
    }

    /// Arguments declared by the task itself (after those of its capabilities).
    fn arguments(&self) -> Vec<ArgumentSpec> {
        Vec::new()
    }

    /// Optional one-liner printed before the operation of a top-level run.
    fn start_message(&self) -> Option<String> {
        None
    }

    /// Channels hidden while the operation runs, before `hide=`/`show=`.
    fn hidden_channels(&self, is_subtask: bool) -> Vec<Channel> {
        let _ = is_subtask;
        vec![Channel::Running, Channel::Stdout]
    }

    fn operation(&self, ctx: &TaskContext<'_>, args: &Args) -> Result<Value>;
}

/// Capability specs in composition order, then the task's own, required
/// first.
pub fn merged_schema(task: &dyn Task) -> Schema {
    let groups = task
        .capabilities()
        .into_iter()
        .map(|cap| cap.arguments())
        .chain(std::iter::once(task.arguments()));
    Schema::merge(groups)
}

/// Control keys reserved by the task's capabilities.
pub fn control_keys(task: &dyn Task) -> Vec<ControlKey> {
    task.capabilities()
        .into_iter()
        .flat_map(|cap| cap.control_keys().iter().copied())
        .collect()
}
