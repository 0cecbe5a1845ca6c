// ABOUTME: Error types for deployment pipeline failures.
// ABOUTME: Maps each failure onto a kind and the commands that recover from it.

use crate::executor::{ExecutorError, PreflightError};
use crate::lock::LockError;
use crate::types::Stage;

/// Errors that end a deployment.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Lock(#[from] LockError),

    /// A preflight check refused the deployment.
    #[error("preflight check failed: {0}")]
    PreflightFailed(#[from] PreflightError),

    #[error("build failed: {0}")]
    BuildFailed(#[source] ExecutorError),

    /// The delegated deploy tool failed. Cloud state may be partially applied.
    #[error("deploy failed: {0}")]
    DeployFailed(#[source] ExecutorError),

    #[error("health validation failed: {0}")]
    HealthCheckFailed(String),

    #[error("maintenance mode failed: {0}")]
    MaintenanceFailed(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployErrorKind {
    /// Another run holds the stage.
    LockContention,
    /// Credentials, tests or git state blocked the run before any mutation.
    PreflightFailure,
    /// The build or deploy tool failed.
    DeployDelegateFailure,
    /// Deployed but unhealthy.
    HealthValidationFailure,
    /// Placeholder could not be enabled or routing could not be restored.
    MaintenanceFailure,
    /// Bad or unusable configuration or local state.
    Configuration,
}

impl DeployError {
    pub fn config_error(message: impl Into<String>) -> Self {
        DeployError::ConfigError(message.into())
    }

    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Lock(e) if e.is_contention() => DeployErrorKind::LockContention,
            DeployError::Lock(_) | DeployError::ConfigError(_) => DeployErrorKind::Configuration,
            DeployError::PreflightFailed(_) => DeployErrorKind::PreflightFailure,
            DeployError::BuildFailed(_) | DeployError::DeployFailed(_) => {
                DeployErrorKind::DeployDelegateFailure
            }
            DeployError::HealthCheckFailed(_) => DeployErrorKind::HealthValidationFailure,
            DeployError::MaintenanceFailed(_) => DeployErrorKind::MaintenanceFailure,
        }
    }

    /// Whether the run stopped before anything was mutated.
    pub fn before_mutation(&self) -> bool {
        matches!(
            self.kind(),
            DeployErrorKind::LockContention | DeployErrorKind::PreflightFailure
        )
    }

    /// Commands the operator can run next.
    pub fn recovery_hint(&self, stage: Stage) -> Vec<String> {
        let retry = format!("stagecoach deploy {stage}");
        let recover = format!("stagecoach recover {stage}");
        match self.kind() {
            DeployErrorKind::LockContention => vec![
                format!("stagecoach status {stage}   # see who holds the lock"),
                format!("{recover}   # clear it if that run is gone"),
            ],
            DeployErrorKind::PreflightFailure | DeployErrorKind::Configuration => {
                vec![format!("{retry}   # after fixing the problem above")]
            }
            DeployErrorKind::DeployDelegateFailure
            | DeployErrorKind::HealthValidationFailure
            | DeployErrorKind::MaintenanceFailure => vec![
                format!("{retry}   # retry"),
                format!("{recover}   # force-clear deployment and state locks"),
            ],
        }
    }
}
