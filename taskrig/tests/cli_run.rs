//! CLI tests for `taskrig run`, `list` and `init`.
//!
//! Spawns the taskrig binary against a scratch settings file and checks
//! exit codes and console output.

use std::process::{Command, Output, Stdio};

use taskrig::exit_codes;
use taskrig::test_support::TempSettings;

fn settings_in_scratch_dir() -> TempSettings {
    let scratch = TempSettings::new("").expect("scratch");
    let contents = format!("[paths]\nlocal = \"{}\"\n", scratch.dir().display());
    std::fs::write(&scratch.path, contents).expect("write settings");
    scratch
}

fn taskrig(settings: &TempSettings, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taskrig"))
        .current_dir(settings.dir())
        .arg("--settings")
        .arg(&settings.path)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("spawn taskrig")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_prints_usage() {
    let settings = settings_in_scratch_dir();
    let output = taskrig(&settings, &["run", "media.sync:help"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let out = stdout(&output);
    assert!(out.contains("Task usage:"), "{out}");
    assert!(out.contains("taskrig run media.sync:target=<local|remote>,[confirm=<yes|y|1>]"));
}

#[test]
fn missing_argument_prints_usage_and_exits_invalid() {
    let settings = settings_in_scratch_dir();
    let output = taskrig(&settings, &["run", "base.run_target:local"]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(stderr(&output).contains("The task was called incorrectly"));
    assert!(stdout(&output).contains("taskrig run base.run_target:target=<local|remote>,command=<shell command>"));
}

#[test]
fn local_command_runs_in_the_local_path() {
    let settings = settings_in_scratch_dir();
    std::fs::write(settings.dir().join("marker.txt"), "x").expect("marker");
    let output = taskrig(&settings, &["run", "base.run_target:local,ls"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Run a shell command on the target"));
    assert!(out.contains("[local] out: marker.txt"), "{out}");
}

#[test]
fn failing_command_exits_failed() {
    let settings = settings_in_scratch_dir();
    let output = taskrig(&settings, &["run", "base.run_target:local,exit 7"]);

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(stderr(&output).contains("base.run_target failed"));
}

#[test]
fn declined_confirmation_cancels_without_touching_files() {
    let settings = settings_in_scratch_dir();
    let keep = settings.dir().join("keep.txt");
    std::fs::write(&keep, "x").expect("keep");
    let output = taskrig(&settings, &["run", "fs.drop:local,confirm=no"]);

    assert_eq!(output.status.code(), Some(exit_codes::ABORTED));
    assert!(stderr(&output).contains("Cancelling task..."));
    assert!(keep.exists());
}

#[test]
fn first_failure_stops_the_remaining_tasks() {
    let settings = settings_in_scratch_dir();
    let output = taskrig(
        &settings,
        &[
            "run",
            "nope.task",
            "base.run_target:local,touch ran.txt",
        ],
    );

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(stderr(&output).contains("unknown task `nope.task`"));
    assert!(!settings.dir().join("ran.txt").exists());
}

#[test]
fn list_shows_builtin_tasks() {
    let settings = settings_in_scratch_dir();
    let output = taskrig(&settings, &["list"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let out = stdout(&output);
    for id in ["base.get_file", "base.run_target", "fs.drop", "fs.symlink", "media.sync"] {
        assert!(out.contains(id), "{id} missing from {out}");
    }
}

#[test]
fn init_writes_settings_once() {
    let scratch = TempSettings::new("").expect("scratch");
    let path = scratch.dir().join("fresh.toml");
    let run_init = |force: bool| {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_taskrig"));
        cmd.current_dir(scratch.dir()).arg("--settings").arg(&path).arg("init");
        if force {
            cmd.arg("--force");
        }
        cmd.output().expect("spawn taskrig")
    };

    let first = run_init(false);
    assert_eq!(first.status.code(), Some(exit_codes::OK));
    let written = std::fs::read_to_string(&path).expect("settings written");
    assert!(written.contains("[engine]"));

    std::fs::write(&path, "# edited\n").expect("edit");
    let second = run_init(false);
    assert!(stdout(&second).contains("already exists"));
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "# edited\n");

    run_init(true);
    assert!(std::fs::read_to_string(&path).expect("read").contains("[engine]"));
}
