//! Target executor: the only place commands actually run.
//!
//! The [`TargetExecutor`] trait decouples the task engine from how a command
//! reaches a target. Tests use recording executors that never spawn
//! processes; the binary uses [`ShellExecutor`] (`sh -c` locally, `ssh` /
//! `scp` for the remote target).

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

use crate::core::target::Target;
use crate::io::process::{ProcessLimits, run_process};
use crate::io::settings::{RemoteConfig, Settings, SettingsProvider};

/// Captured output of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs commands on a target. Blocking; returns once the command finished.
pub trait TargetExecutor {
    fn run_local(&self, command: &str) -> Result<ExecOutput>;

    /// Runs in the remote target's working directory.
    fn run_remote(&self, command: &str) -> Result<ExecOutput>;

    /// Copy `source` on target `from` to `destination` on `from.reverse()`.
    fn copy(&self, from: Target, source: &str, destination: &str) -> Result<()>;

    fn run(&self, target: Target, command: &str) -> Result<ExecOutput> {
        match target {
            Target::Local => self.run_local(command),
            Target::Remote => self.run_remote(command),
        }
    }
}

/// Executor backed by `sh`, `ssh` and `scp`.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    limits: ProcessLimits,
    local_dir: Option<PathBuf>,
    remote_dir: Option<String>,
    remote: RemoteConfig,
}

impl ShellExecutor {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            limits: ProcessLimits {
                timeout: Duration::from_secs(settings.engine.command_timeout_secs),
                output_limit_bytes: settings.engine.output_limit_bytes,
            },
            local_dir: settings.target_path(Target::Local).map(PathBuf::from),
            remote_dir: settings.target_path(Target::Remote).map(str::to_string),
            remote: settings.remote.clone(),
        }
    }

    fn host(&self) -> Result<&str> {
        self.remote
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| anyhow!("remote.host is not configured"))
    }

    fn base_command(parts: &[String]) -> Result<Command> {
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| anyhow!("empty command template"))?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        Ok(cmd)
    }

    fn finish(&self, cmd: Command, label: &str) -> Result<ExecOutput> {
        let output = run_process(cmd, self.limits)
            .with_context(|| format!("run {label}"))?
            .ensure_success(label)?;
        Ok(ExecOutput {
            stdout: output.stdout_lossy(),
            stderr: output.stderr_lossy(),
        })
    }
}

impl TargetExecutor for ShellExecutor {
    #[instrument(skip(self))]
    fn run_local(&self, command: &str) -> Result<ExecOutput> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(dir) = &self.local_dir {
            cmd.current_dir(dir);
        }
        self.finish(cmd, "local command")
    }

    #[instrument(skip(self))]
    fn run_remote(&self, command: &str) -> Result<ExecOutput> {
        let host = self.host()?;
        let mut cmd = Self::base_command(&self.remote.ssh_command)?;
        cmd.arg(host).arg(remote_script(self.remote_dir.as_deref(), command));
        self.finish(cmd, "remote command")
    }

    #[instrument(skip(self))]
    fn copy(&self, from: Target, source: &str, destination: &str) -> Result<()> {
        let host = self.host()?;
        let mut cmd = match from {
            Target::Remote => {
                let mut cmd = Self::base_command(&self.remote.scp_command)?;
                cmd.arg(format!("{host}:{source}")).arg(destination);
                cmd
            }
            // The local source goes through `sh` so globs expand, as the
            // remote source does on the far side.
            Target::Local => {
                let program: Vec<String> =
                    self.remote.scp_command.iter().map(|w| shell_quote(w)).collect();
                let script = format!(
                    "exec {} {} {}",
                    program.join(" "),
                    glob_source(source),
                    shell_quote(&format!("{host}:{destination}"))
                );
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(script);
                cmd
            }
        };
        if let Some(dir) = &self.local_dir {
            cmd.current_dir(dir);
        }
        debug!(%from, "copying between targets");
        self.finish(cmd, "copy").map(|_| ())
    }
}

/// Script handed to the remote shell: change into the working directory
/// first when one is configured.
fn remote_script(dir: Option<&str>, command: &str) -> String {
    match dir {
        Some(dir) => format!("cd {} && {command}", shell_quote(dir)),
        None => command.to_string(),
    }
}

/// Quote a copy source for `sh`, leaving a globbing last segment bare so
/// it still expands.
fn glob_source(source: &str) -> String {
    let (dir, last) = match source.rsplit_once('/') {
        Some((dir, last)) => (Some(dir), last),
        None => (None, source),
    };
    if !last.contains(['*', '?', '[']) {
        return shell_quote(source);
    }
    match dir {
        Some("") => format!("/{last}"),
        Some(dir) => format!("{}/{last}", shell_quote(dir)),
        None => last.to_string(),
    }
}

/// Single-quote a word for POSIX shells.
pub fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}
