//! Interactive yes/no prompt used by confirmation-gated tasks.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use tracing::warn;

pub trait Confirmer {
    /// Ask `question`; `default` is the answer when the user just hits enter.
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;
}

/// Prompts on the controlling terminal.
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        if !std::io::stdin().is_terminal() {
            warn!(default, "stdin is not a terminal, answering confirmation with default");
            return Ok(default);
        }
        Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
            .context("read confirmation")
    }
}
