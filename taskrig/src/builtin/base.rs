//! Building blocks other tasks call as subtasks.

use anyhow::Result;
use serde_json::Value;

use crate::context::TaskContext;
use crate::core::args::Args;
use crate::core::argument::{ArgumentSpec, check, parse};
use crate::core::visibility::Channel;
use crate::task::{Capability, Task, TargetCapability};

/// `base.run_target`: run one shell command on a target.
#[derive(Debug, Default)]
pub struct RunTarget {
    target: TargetCapability,
}

impl Task for RunTarget {
    fn namespace(&self) -> &'static str {
        "base"
    }

    fn name(&self) -> &'static str {
        "run_target"
    }

    fn description(&self) -> &'static str {
        "Run a shell command on the target"
    }

    fn capabilities(&self) -> Vec<&dyn Capability> {
        vec![&self.target as &dyn Capability]
    }

    fn arguments(&self) -> Vec<ArgumentSpec> {
        vec![
            ArgumentSpec::required("command", "shell command")
                .parser(parse::text)
                .checker(check::non_empty),
            ArgumentSpec::optional("capture", "yes|no").parser(parse::boolean),
        ]
    }

    /// Top-level runs show the command's stdout; subtasks keep it to
    /// themselves.
    fn hidden_channels(&self, is_subtask: bool) -> Vec<Channel> {
        if is_subtask {
            vec![Channel::Running, Channel::Stdout]
        } else {
            vec![Channel::Running]
        }
    }

    /// `capture=no` streams the output, subtask or not, and returns null.
    fn operation(&self, ctx: &TaskContext<'_>, args: &Args) -> Result<Value> {
        let target = args.target()?;
        let command = args.str("command")?;
        if args.bool_or("capture", true) {
            return Ok(Value::String(ctx.run(target, command)?));
        }
        ctx.scoped(&[], &[Channel::Stdout, Channel::Stderr], |ctx| {
            ctx.run(target, command)
        })?;
        Ok(Value::Null)
    }
}

/// `base.get_file`: copy a path from the other target into this one.
#[derive(Debug, Default)]
pub struct GetFile {
    target: TargetCapability,
}

impl Task for GetFile {
    fn namespace(&self) -> &'static str {
        "base"
    }

    fn name(&self) -> &'static str {
        "get_file"
    }

    fn description(&self) -> &'static str {
        "Download a file from the other target into the target"
    }

    fn capabilities(&self) -> Vec<&dyn Capability> {
        vec![&self.target as &dyn Capability]
    }

    fn arguments(&self) -> Vec<ArgumentSpec> {
        vec![
            ArgumentSpec::required("origin_path", "path").checker(check::non_empty),
            ArgumentSpec::required("target_path", "path").checker(check::non_empty),
        ]
    }

    fn hidden_channels(&self, _is_subtask: bool) -> Vec<Channel> {
        vec![Channel::Running, Channel::Stdout, Channel::Warnings]
    }

    fn operation(&self, ctx: &TaskContext<'_>, args: &Args) -> Result<Value> {
        let target = args.target()?;
        let origin = target.reverse();
        let origin_path = args.str("origin_path")?;
        let target_path = args.str("target_path")?;
        ctx.log(&format!(
            "Downloading from {origin}:{origin_path} to {target}:{target_path}..."
        ));
        ctx.copy(origin, origin_path, target_path)?;
        Ok(Value::Null)
    }
}
