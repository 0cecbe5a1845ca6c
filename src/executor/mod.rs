// ABOUTME: Adapters for the work the orchestrator delegates: commands, deploys, health probes.
// ABOUTME: The deploy pipeline only sees the traits defined here.

mod command;
mod deploy;
mod health;
mod output_parser;
mod preflight;

pub use command::{CommandError, CommandOutput, CommandRunner};
pub use deploy::{CommandDeployExecutor, DeployExecutor, DeployOutput};
pub use health::{HealthProber, HttpHealthProber, probe_budget};
pub use output_parser::extract_distribution_id;
pub use preflight::{
    CredentialsCheck, GitCleanCheck, PreflightCheck, PreflightError, TestCommandCheck,
    default_checks,
};

use std::time::Duration;

/// Errors from delegated build, deploy and probe work.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("{step} exited with code {code}: {summary}")]
    Failed {
        step: String,
        code: i32,
        summary: String,
    },

    #[error("health checks did not finish within {0:?}")]
    HealthTimeout(Duration),

    #[error("health probe setup failed: {0}")]
    Probe(String),
}

impl ExecutorError {
    pub(crate) fn failed(step: &str, output: &CommandOutput) -> Self {
        ExecutorError::Failed {
            step: step.to_string(),
            code: output.exit_code,
            summary: output.failure_summary(),
        }
    }
}
