//! Child process runner with a wall-clock budget and bounded capture.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Limits applied to every spawned command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessLimits {
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

/// Captured output of a finished (or killed) child.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub truncated_bytes: usize,
    pub timed_out: bool,
}

impl ProcessOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Turn timeouts and non-zero exits into errors that carry stderr.
    pub fn ensure_success(self, label: &str) -> Result<Self> {
        if self.timed_out {
            return Err(anyhow!("{label} timed out"));
        }
        if !self.status.success() {
            let stderr = self.stderr_lossy();
            let detail = if stderr.trim().is_empty() {
                self.stdout_lossy()
            } else {
                stderr
            };
            return Err(anyhow!(
                "{label} failed with status {:?}: {}",
                self.status.code(),
                detail.trim()
            ));
        }
        Ok(self)
    }
}

/// Run `cmd` with stdin closed, draining stdout and stderr on their own
/// threads so a chatty child can never block on a full pipe.
#[instrument(skip_all, fields(timeout_secs = limits.timeout.as_secs()))]
pub fn run_process(mut cmd: Command, limits: ProcessLimits) -> Result<ProcessOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(program = ?cmd.get_program(), "spawning child process");
    let mut child = cmd.spawn().context("spawn command")?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let limit = limits.output_limit_bytes;
    let stdout_handle = thread::spawn(move || read_limited(stdout, limit));
    let stderr_handle = thread::spawn(move || read_limited(stderr, limit));

    let mut timed_out = false;
    let status = match child.wait_timeout(limits.timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = limits.timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let (stdout, stdout_truncated) = join_reader(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_reader(stderr_handle).context("join stderr")?;
    let truncated_bytes = stdout_truncated + stderr_truncated;
    if truncated_bytes > 0 {
        warn!(truncated_bytes, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
        truncated_bytes,
        timed_out,
    })
}

fn join_reader(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))?
}

/// Read everything, keeping at most `limit` bytes. Returns the kept bytes and
/// how many were dropped.
fn read_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut dropped = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let keep = n.min(limit.saturating_sub(buf.len()));
        buf.extend_from_slice(&chunk[..keep]);
        dropped += n - keep;
    }

    Ok((buf, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(output_limit_bytes: usize) -> ProcessLimits {
        ProcessLimits {
            timeout: Duration::from_secs(10),
            output_limit_bytes,
        }
    }

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_stdout_and_stderr() {
        let output = run_process(sh("echo out; echo err >&2"), limits(1000)).expect("run");
        assert!(output.status.success());
        assert_eq!(output.stdout_lossy(), "out\n");
        assert_eq!(output.stderr_lossy(), "err\n");
    }

    #[test]
    fn truncates_beyond_limit() {
        let output = run_process(sh("printf 'abcdefghij'"), limits(4)).expect("run");
        assert_eq!(output.stdout, b"abcd");
        assert_eq!(output.truncated_bytes, 6);
    }

    #[test]
    fn kills_on_timeout() {
        let output = run_process(
            sh("exec sleep 5"),
            ProcessLimits {
                timeout: Duration::from_millis(100),
                output_limit_bytes: 100,
            },
        )
        .expect("run");
        assert!(output.timed_out);
        assert!(output.ensure_success("sleep").is_err());
    }

    #[test]
    fn non_zero_exit_carries_stderr() {
        let output = run_process(sh("echo broken >&2; exit 3"), limits(100)).expect("run");
        let err = output.ensure_success("script").unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
