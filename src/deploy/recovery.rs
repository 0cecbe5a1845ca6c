// ABOUTME: Operator-driven recovery from interrupted deployments.
// ABOUTME: Clears a stage's deployment lock and the deploy tool's state lock after confirmation.

use serde::Serialize;

use crate::confirm::Confirm;
use crate::lock::{DeploymentLock, LockError, LockManager, LockStatus, PulumiLockCheck};
use crate::types::Stage;

/// What happened to the stage's deployment lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "lock", rename_all = "snake_case")]
pub enum LockRecovery {
    NotLocked,
    ClearedStale(DeploymentLock),
    /// Cleared although unexpired, on explicit confirmation.
    ClearedActive(DeploymentLock),
    /// Operator declined.
    Kept(DeploymentLock),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    pub stage: Stage,
    pub lock: LockRecovery,
    pub pulumi: PulumiLockCheck,
}

impl RecoveryReport {
    /// Whether the stage can now be deployed without contention.
    pub fn stage_unblocked(&self) -> bool {
        !matches!(self.lock, LockRecovery::Kept(_)) && self.pulumi != PulumiLockCheck::Kept
    }
}

/// Inspect and clear locks left by a crashed or interrupted run.
///
/// A stale lock is cleared on confirmation. An active lock may belong to a
/// deployment that is still running, so the prompt says so.
pub async fn recover(
    locks: &LockManager,
    stage: Stage,
    confirm: &dyn Confirm,
) -> Result<RecoveryReport, LockError> {
    let lock = match locks.lock_status(stage)? {
        LockStatus::Free => LockRecovery::NotLocked,
        LockStatus::Stale(lock) => {
            let message = format!(
                "{stage} lock held by {} expired at {}. Clear it?",
                lock.holder_id,
                lock.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if confirm.confirm(&message) {
                locks.force_release(stage)?;
                LockRecovery::ClearedStale(lock)
            } else {
                LockRecovery::Kept(lock)
            }
        }
        LockStatus::Active(lock) => {
            tracing::warn!(
                "{stage} lock held by {} has not expired; a deployment may be in progress",
                lock.holder_id
            );
            let message = format!(
                "{stage} lock held by {} is still active until {}. A deployment may be in progress. Clear it anyway?",
                lock.holder_id,
                lock.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if confirm.confirm(&message) {
                locks.force_release(stage)?;
                LockRecovery::ClearedActive(lock)
            } else {
                LockRecovery::Kept(lock)
            }
        }
    };

    let pulumi = locks.check_and_clean_pulumi_lock(stage, confirm).await?;
    Ok(RecoveryReport {
        stage,
        lock,
        pulumi,
    })
}
