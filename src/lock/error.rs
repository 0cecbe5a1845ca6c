// ABOUTME: Error types for deployment lock and external state lock handling.
// ABOUTME: Contention variants carry enough holder detail to suggest status/recover.

use std::path::PathBuf;

use super::DeploymentLock;
use crate::types::Stage;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another run holds the stage, stale or not.
    #[error(
        "stage {} is locked by {} since {} (expires {})",
        .lock.stage,
        .lock.holder_id,
        .lock.acquired_at.format("%Y-%m-%d %H:%M:%S UTC"),
        .lock.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    )]
    Held { lock: Box<DeploymentLock> },

    /// Lock file exists but is mid-write or unreadable.
    #[error("stage {stage} is locked (lock file {path} could not be read)")]
    HeldUnreadable { stage: Stage, path: PathBuf },

    #[error("failed to access lock file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock file {path} is corrupted: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize lock: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("state lock backend error: {0}")]
    StateBackend(String),
}

impl LockError {
    /// Whether this error means another deployment holds the stage.
    pub fn is_contention(&self) -> bool {
        matches!(self, LockError::Held { .. } | LockError::HeldUnreadable { .. })
    }

    /// The existing lock, when the holder could be read.
    pub fn holder(&self) -> Option<&DeploymentLock> {
        match self {
            LockError::Held { lock } => Some(lock),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LockError::Io {
            path: path.into(),
            source,
        }
    }
}
