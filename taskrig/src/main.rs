//! `taskrig`: run parameterized shell tasks against a local and a remote
//! target.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use taskrig::cli::{default_engine, run_task_strings};
use taskrig::exit_codes;
use taskrig::io::settings::{DEFAULT_SETTINGS_FILE, init_settings, load_settings};
use taskrig::logging;

#[derive(Parser)]
#[command(
    name = "taskrig",
    version,
    about = "Parameterized shell tasks for a local and a remote target"
)]
struct Cli {
    /// Settings file (TOML). Missing means defaults.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run tasks in order: `<namespace>.<name>[:<arg>,<name>=<value>,...]`.
    ///
    /// Pass `help` as the only argument to print a task's usage.
    Run {
        #[arg(required = true, value_name = "TASK")]
        tasks: Vec<String>,
    },
    /// List registered tasks.
    List,
    /// Write a commented default settings file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run { tasks } => {
            let engine = default_engine(load_settings(&cli.settings)?)?;
            Ok(run_task_strings(&engine, &tasks))
        }
        Command::List => {
            let engine = default_engine(load_settings(&cli.settings)?)?;
            for task in engine.tasks().list() {
                println!("{:<20} {}", task.id, task.summary);
            }
            Ok(exit_codes::OK)
        }
        Command::Init { force } => {
            if init_settings(&cli.settings, force)? {
                println!("wrote {}", cli.settings.display());
            } else {
                println!(
                    "{} already exists (use --force to overwrite)",
                    cli.settings.display()
                );
            }
            Ok(exit_codes::OK)
        }
    }
}
