//! Side-effecting collaborators: settings file, processes, prompts, output.

pub mod confirm;
pub mod executor;
pub mod output;
pub mod process;
pub mod settings;
