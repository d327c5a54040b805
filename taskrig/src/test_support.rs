//! Scripted collaborators and fixture tasks shared by unit and
//! integration tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::builtin::register_all;
use crate::context::TaskContext;
use crate::core::args::Args;
use crate::core::argument::{ArgumentSpec, check, display_raw, parse};
use crate::core::invocation::Invocation;
use crate::core::target::Target;
use crate::engine::Engine;
use crate::io::confirm::Confirmer;
use crate::io::executor::{ExecOutput, TargetExecutor};
use crate::io::output::{Emphasis, OutputSink};
use crate::io::settings::Settings;
use crate::task::{Capability, ConfirmGate, Task, TargetCapability};

/// Settings most engine tests start from.
pub const TEST_SETTINGS: &str = r#"
[paths]
local = "/work/site"
remote = "/srv/site"

[remote]
host = "deploy@box"
"#;

/// One call that reached the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecCall {
    Run {
        target: Target,
        command: String,
    },
    Copy {
        from: Target,
        source: String,
        destination: String,
    },
}

/// Records calls and answers with scripted output. Clones share state, so
/// keep one handle after moving another into the engine.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    calls: Rc<RefCell<Vec<ExecCall>>>,
    responses: Rc<RefCell<BTreeMap<String, ExecOutput>>>,
    failures: Rc<RefCell<Vec<String>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with `stdout` (and `stderr`).
    pub fn respond(&self, command: &str, stdout: &str, stderr: &str) {
        self.responses.borrow_mut().insert(
            command.to_string(),
            ExecOutput {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        );
    }

    /// Fail every command (or copy source) containing `needle`.
    pub fn fail_on(&self, needle: &str) {
        self.failures.borrow_mut().push(needle.to_string());
    }

    pub fn calls(&self) -> Vec<ExecCall> {
        self.calls.borrow().clone()
    }

    /// Commands run, in order, ignoring copies.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                ExecCall::Run { command, .. } => Some(command.clone()),
                ExecCall::Copy { .. } => None,
            })
            .collect()
    }

    fn check_failure(&self, subject: &str) -> Result<()> {
        if self
            .failures
            .borrow()
            .iter()
            .any(|needle| subject.contains(needle.as_str()))
        {
            bail!("scripted failure: {subject}");
        }
        Ok(())
    }

    fn record_run(&self, target: Target, command: &str) -> Result<ExecOutput> {
        self.calls.borrow_mut().push(ExecCall::Run {
            target,
            command: command.to_string(),
        });
        self.check_failure(command)?;
        Ok(self
            .responses
            .borrow()
            .get(command)
            .cloned()
            .unwrap_or_default())
    }
}

impl TargetExecutor for RecordingExecutor {
    fn run_local(&self, command: &str) -> Result<ExecOutput> {
        self.record_run(Target::Local, command)
    }

    fn run_remote(&self, command: &str) -> Result<ExecOutput> {
        self.record_run(Target::Remote, command)
    }

    fn copy(&self, from: Target, source: &str, destination: &str) -> Result<()> {
        self.calls.borrow_mut().push(ExecCall::Copy {
            from,
            source: source.to_string(),
            destination: destination.to_string(),
        });
        self.check_failure(source)
    }
}

/// Answers prompts from a queue; an empty queue answers the default.
#[derive(Clone, Default)]
pub struct ScriptedConfirmer {
    answers: Rc<RefCell<VecDeque<bool>>>,
    asked: Rc<RefCell<Vec<String>>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Rc::new(RefCell::new(answers.into_iter().collect())),
            asked: Rc::default(),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        self.asked.borrow_mut().push(question.to_string());
        Ok(self.answers.borrow_mut().pop_front().unwrap_or(default))
    }
}

/// Keeps every emitted message.
#[derive(Clone, Default)]
pub struct MemorySink {
    messages: Rc<RefCell<Vec<(Emphasis, String)>>>,
}

impl MemorySink {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(emphasis, _)| *emphasis == Emphasis::Error)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Everything emitted, one message per line.
    pub fn text(&self) -> String {
        self.messages().join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages
            .borrow()
            .iter()
            .any(|(_, message)| message.contains(needle))
    }

    /// Index of the first message containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.messages
            .borrow()
            .iter()
            .position(|(_, message)| message.contains(needle))
    }
}

impl OutputSink for MemorySink {
    fn emit(&self, message: &str, emphasis: Emphasis) {
        self.messages
            .borrow_mut()
            .push((emphasis, message.to_string()));
    }
}

/// An engine with built-in and fixture tasks over scripted collaborators.
pub struct TestEngine {
    pub engine: Engine,
    pub executor: RecordingExecutor,
    pub confirmer: ScriptedConfirmer,
    pub sink: MemorySink,
}

impl TestEngine {
    pub fn new(settings: &str) -> Result<Self> {
        Self::with_answers(settings, [])
    }

    pub fn with_answers(settings: &str, answers: impl IntoIterator<Item = bool>) -> Result<Self> {
        let settings = Settings::from_toml_str(settings).context("parse test settings")?;
        let executor = RecordingExecutor::new();
        let confirmer = ScriptedConfirmer::new(answers);
        let sink = MemorySink::default();
        let mut engine = Engine::new(settings, executor.clone(), confirmer.clone(), sink.clone());
        register_all(&mut engine)?;
        engine.register(Echo)?;
        engine.register(Relay)?;
        engine.register(Explode)?;
        engine.register(Guarded::default())?;
        Ok(Self {
            engine,
            executor,
            confirmer,
            sink,
        })
    }

    pub fn run(&self, task_id: &str, invocation: Invocation) -> crate::error::TaskResult<Value> {
        self.engine.run(task_id, invocation)
    }
}

/// `fixture.echo`: logs `message` and returns the bound arguments.
pub struct Echo;

impl Task for Echo {
    fn namespace(&self) -> &'static str {
        "fixture"
    }
    fn name(&self) -> &'static str {
        "echo"
    }
    fn description(&self) -> &'static str {
        "Log a message"
    }
    fn arguments(&self) -> Vec<ArgumentSpec> {
        vec![
            ArgumentSpec::required("message", "text").checker(check::non_empty),
            ArgumentSpec::optional("times", "integer").parser(parse::integer),
        ]
    }
    fn start_message(&self) -> Option<String> {
        Some("echoing".to_string())
    }
    fn operation(&self, ctx: &TaskContext<'_>, args: &Args) -> Result<Value> {
        ctx.log(&args.get("message").map(display_raw).unwrap_or_default());
        ctx.warn("echo warning");
        Ok(json!({
            "message": args.get("message"),
            "times": args.get("times"),
            "subtask": ctx.is_subtask(),
            "silent": ctx.is_silent(),
        }))
    }
}

/// `fixture.relay`: runs `fixture.echo` as a subtask with the given
/// invocation values.
pub struct Relay;

impl Task for Relay {
    fn namespace(&self) -> &'static str {
        "fixture"
    }
    fn name(&self) -> &'static str {
        "relay"
    }
    fn description(&self) -> &'static str {
        "Call fixture.echo as a subtask"
    }
    fn arguments(&self) -> Vec<ArgumentSpec> {
        vec![ArgumentSpec::required("message", "anything").parser(parse::identity)]
    }
    fn operation(&self, ctx: &TaskContext<'_>, args: &Args) -> Result<Value> {
        let message = args.get("message").cloned().unwrap_or(Value::Null);
        Ok(ctx.subtask("fixture.echo", Invocation::trusted().arg(message))?)
    }
}

/// `fixture.explode`: always fails.
pub struct Explode;

impl Task for Explode {
    fn namespace(&self) -> &'static str {
        "fixture"
    }
    fn name(&self) -> &'static str {
        "explode"
    }
    fn description(&self) -> &'static str {
        "Fail on purpose"
    }
    fn operation(&self, _ctx: &TaskContext<'_>, _args: &Args) -> Result<Value> {
        bail!("kaboom")
    }
}

/// `fixture.guarded`: confirmation plus target, runs `true` on the target.
#[derive(Default)]
pub struct Guarded {
    confirm: ConfirmGate,
    target: TargetCapability,
}

impl Task for Guarded {
    fn namespace(&self) -> &'static str {
        "fixture"
    }
    fn name(&self) -> &'static str {
        "guarded"
    }
    fn description(&self) -> &'static str {
        "Confirm, then touch the target"
    }
    fn capabilities(&self) -> Vec<&dyn Capability> {
        vec![&self.confirm as &dyn Capability, &self.target]
    }
    fn operation(&self, ctx: &TaskContext<'_>, args: &Args) -> Result<Value> {
        ctx.run(args.target()?, "true")?;
        Ok(Value::Null)
    }
}

/// A settings file in a scratch directory.
pub struct TempSettings {
    dir: TempDir,
    pub path: PathBuf,
}

impl TempSettings {
    pub fn new(contents: &str) -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        let path = dir.path().join(crate::io::settings::DEFAULT_SETTINGS_FILE);
        std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(Self { dir, path })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
