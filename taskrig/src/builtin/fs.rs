//! Filesystem chores on a target's working directory.

use anyhow::{Result, bail};
use serde_json::Value;

use super::join_path;
use crate::context::TaskContext;
use crate::core::args::Args;
use crate::core::argument::{ArgumentSpec, check};
use crate::core::invocation::Invocation;
use crate::core::target::Target;
use crate::core::visibility::Channel;
use crate::io::executor::shell_quote;
use crate::task::{Capability, ConfirmGate, Task, TargetCapability};

/// `fs.drop`: remove everything under the target's configured path.
#[derive(Debug)]
pub struct DropFiles {
    confirm: ConfirmGate,
    target: TargetCapability,
}

impl Default for DropFiles {
    fn default() -> Self {
        Self {
            confirm: ConfirmGate::new("Every file under the target path will be removed. "),
            target: TargetCapability,
        }
    }
}

impl Task for DropFiles {
    fn namespace(&self) -> &'static str {
        "fs"
    }

    fn name(&self) -> &'static str {
        "drop"
    }

    fn description(&self) -> &'static str {
        "Remove all files under the target's configured path"
    }

    fn capabilities(&self) -> Vec<&dyn Capability> {
        vec![&self.confirm as &dyn Capability, &self.target]
    }

    fn start_message(&self) -> Option<String> {
        Some("removing files".to_string())
    }

    fn operation(&self, ctx: &TaskContext<'_>, args: &Args) -> Result<Value> {
        let target = args.target()?;
        let path = ctx.target_path(target)?;
        if path.trim().trim_end_matches('/').is_empty() {
            bail!("refusing to drop the filesystem root (paths.{target} = {path:?})");
        }
        let command = format!(
            "find {} -mindepth 1 -maxdepth 1 -exec rm -rf {{}} +",
            shell_quote(path)
        );
        ctx.subtask(
            "base.run_target",
            Invocation::trusted()
                .with("target", target.as_str())
                .with("command", command),
        )?;
        Ok(Value::Null)
    }
}

/// `fs.symlink`: link `path` from inside the local working directory.
#[derive(Debug, Default)]
pub struct Symlink;

impl Task for Symlink {
    fn namespace(&self) -> &'static str {
        "fs"
    }

    fn name(&self) -> &'static str {
        "symlink"
    }

    fn description(&self) -> &'static str {
        "Create a symlink to path inside the local path (under directory, if given)"
    }

    fn arguments(&self) -> Vec<ArgumentSpec> {
        vec![
            ArgumentSpec::required("path", "path").checker(check::non_empty),
            ArgumentSpec::required("link_name", "name").checker(check::non_empty),
            ArgumentSpec::optional("directory", "relative path"),
        ]
    }

    /// Returns whether the link was created. A failing `ln` is only a
    /// warning.
    fn operation(&self, ctx: &TaskContext<'_>, args: &Args) -> Result<Value> {
        let path = args.str("path")?;
        let local = ctx.target_path(Target::Local)?;
        let directory = args.opt_str("directory").unwrap_or_default();
        let link = join_path(&join_path(local, directory), args.str("link_name")?);

        ctx.info(&format!("Symlinking {path} to {link}"));
        let command = format!("ln -s {} {}", shell_quote(path), shell_quote(&link));
        let created = ctx.scoped(&Channel::ALL, &[], |quiet| {
            quiet.subtask(
                "base.run_target",
                Invocation::trusted()
                    .with("target", Target::Local.as_str())
                    .with("command", command),
            )
        });
        match created {
            Ok(_) => Ok(Value::Bool(true)),
            Err(err) => {
                ctx.warn(&format!("could not create symlink {link}: {err:#}"));
                Ok(Value::Bool(false))
            }
        }
    }
}
