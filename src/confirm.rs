// ABOUTME: Operator confirmation port for irreversible actions.
// ABOUTME: Core logic asks through this trait; the CLI decides how to answer.

use std::io::{BufRead, IsTerminal, Write};

/// Asks the operator to approve a destructive action.
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Approves everything (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, message: &str) -> bool {
        tracing::debug!("auto-confirmed: {message}");
        true
    }
}

/// Declines everything. Used when no terminal is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeNo;

impl Confirm for AssumeNo {
    fn confirm(&self, message: &str) -> bool {
        tracing::debug!("auto-declined: {message}");
        false
    }
}

/// Prompts on stderr and reads a y/N answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, message: &str) -> bool {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            tracing::warn!("no terminal attached, declining: {message}");
            return false;
        }

        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{message} [y/N] ");
        let _ = stderr.flush();

        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Pick the confirmation strategy for a command.
pub fn confirmer(assume_yes: bool) -> Box<dyn Confirm> {
    if assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirm)
    }
}
