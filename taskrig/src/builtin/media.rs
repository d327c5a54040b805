//! Media directory synchronisation between targets.

use anyhow::Result;
use serde_json::Value;

use super::join_path;
use crate::context::TaskContext;
use crate::core::args::Args;
use crate::core::invocation::Invocation;
use crate::task::{Capability, ConfirmGate, Task, TargetCapability};

pub const DEFAULT_MEDIA_DIR: &str = "media";

/// `media.sync`: copy the other target's media files into the target.
#[derive(Debug, Default)]
pub struct SyncMedia {
    confirm: ConfirmGate,
    target: TargetCapability,
}

impl Task for SyncMedia {
    fn namespace(&self) -> &'static str {
        "media"
    }

    fn name(&self) -> &'static str {
        "sync"
    }

    fn description(&self) -> &'static str {
        "Download the other target's media files into the target"
    }

    fn capabilities(&self) -> Vec<&dyn Capability> {
        vec![&self.confirm as &dyn Capability, &self.target]
    }

    fn operation(&self, ctx: &TaskContext<'_>, args: &Args) -> Result<Value> {
        let target = args.target()?;
        let origin = target.reverse();
        let dir = ctx
            .settings()
            .get_str(&["media", "dir"])
            .unwrap_or(DEFAULT_MEDIA_DIR);
        let source = join_path(&join_path(ctx.target_path(origin)?, dir), "*");
        let destination = join_path(ctx.target_path(target)?, dir);

        ctx.log(&format!(
            "Syncing media files from {origin} to {target} (please be patient, this may take some time)"
        ));
        ctx.subtask(
            "base.get_file",
            Invocation::trusted()
                .with("target", target.as_str())
                .with("origin_path", source)
                .with("target_path", destination),
        )?;
        Ok(Value::Null)
    }
}
