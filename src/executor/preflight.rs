// ABOUTME: Pre-deploy checks that run before any lock is taken.
// ABOUTME: Credentials, a clean git tree and the optional test command.

use async_trait::async_trait;
use nonempty::NonEmpty;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::command::CommandRunner;
use crate::applicable::Applicable;
use crate::cloud::IdentityOps;
use crate::config::{Config, STATE_DIR};
use crate::types::Stage;
use crate::zones::ZONES_FILENAME;

/// Why a preflight check refused the deployment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{check}: {reason}")]
pub struct PreflightError {
    pub check: String,
    pub reason: String,
}

impl PreflightError {
    pub fn new(check: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait PreflightCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, stage: Stage) -> Result<Applicable<()>, PreflightError>;
}

/// Cloud credentials resolve to an identity.
pub struct CredentialsCheck {
    identity: Arc<dyn IdentityOps>,
    enabled: bool,
}

impl CredentialsCheck {
    pub fn new(identity: Arc<dyn IdentityOps>, enabled: bool) -> Self {
        Self { identity, enabled }
    }
}

#[async_trait]
impl PreflightCheck for CredentialsCheck {
    fn name(&self) -> &str {
        "credentials"
    }

    async fn run(&self, _stage: Stage) -> Result<Applicable<()>, PreflightError> {
        if !self.enabled {
            return Ok(Applicable::skipped("credential check disabled"));
        }
        let identity = self
            .identity
            .caller_identity()
            .await
            .map_err(|e| PreflightError::new(self.name(), e.to_string()))?;
        tracing::debug!("deploying as {identity}");
        Ok(Applicable::Applied(()))
    }
}

/// No uncommitted changes in the project's git tree.
///
/// Lock records and the zone tracker are runtime state and never count as changes.
pub struct GitCleanCheck {
    runner: CommandRunner,
    stages: BTreeSet<Stage>,
}

impl GitCleanCheck {
    /// Enforced only for `stages`.
    pub fn new(project_root: impl Into<PathBuf>, stages: BTreeSet<Stage>) -> Self {
        Self {
            runner: CommandRunner::new().working_dir(project_root.into()),
            stages,
        }
    }
}

#[async_trait]
impl PreflightCheck for GitCleanCheck {
    fn name(&self) -> &str {
        "git"
    }

    async fn run(&self, stage: Stage) -> Result<Applicable<()>, PreflightError> {
        if !self.stages.contains(&stage) {
            return Ok(Applicable::skipped(format!(
                "clean working tree not required for {stage}"
            )));
        }

        let args = [
            "status".to_string(),
            "--porcelain".to_string(),
            "--untracked-files=all".to_string(),
            "--".to_string(),
            ".".to_string(),
            format!(":(exclude){STATE_DIR}/locks"),
            format!(":(exclude){STATE_DIR}/{ZONES_FILENAME}"),
        ];
        let output = self
            .runner
            .run("git", &args)
            .await
            .map_err(|e| PreflightError::new(self.name(), e.to_string()))?;
        if !output.success() {
            return Err(PreflightError::new(self.name(), output.failure_summary()));
        }

        let changes = output.stdout.lines().filter(|l| !l.trim().is_empty()).count();
        if changes > 0 {
            return Err(PreflightError::new(
                self.name(),
                format!("working tree has {changes} uncommitted change(s)"),
            ));
        }
        Ok(Applicable::Applied(()))
    }
}

/// Project test suite passes.
pub struct TestCommandCheck {
    runner: CommandRunner,
    command: Option<NonEmpty<String>>,
}

impl TestCommandCheck {
    pub fn new(project_root: impl Into<PathBuf>, command: Option<NonEmpty<String>>) -> Self {
        Self {
            runner: CommandRunner::new().working_dir(project_root.into()),
            command,
        }
    }
}

#[async_trait]
impl PreflightCheck for TestCommandCheck {
    fn name(&self) -> &str {
        "tests"
    }

    async fn run(&self, _stage: Stage) -> Result<Applicable<()>, PreflightError> {
        let Some(command) = &self.command else {
            return Ok(Applicable::skipped("no test command configured"));
        };

        let output = self
            .runner
            .run(&command.head, &command.tail)
            .await
            .map_err(|e| PreflightError::new(self.name(), e.to_string()))?;
        if !output.success() {
            return Err(PreflightError::new(self.name(), output.failure_summary()));
        }
        Ok(Applicable::Applied(()))
    }
}

/// The standard check list for a project.
pub fn default_checks(
    config: &Config,
    project_root: impl Into<PathBuf>,
    identity: Arc<dyn IdentityOps>,
) -> Vec<Box<dyn PreflightCheck>> {
    let project_root = project_root.into();
    let clean_stages = config
        .stages
        .keys()
        .copied()
        .filter(|stage| config.requires_clean_git(*stage))
        .collect();

    vec![
        Box::new(CredentialsCheck::new(
            identity,
            config.preflight.check_credentials,
        )),
        Box::new(GitCleanCheck::new(project_root.clone(), clean_stages)),
        Box::new(TestCommandCheck::new(
            project_root,
            config.preflight.test_command.clone(),
        )),
    ]
}
