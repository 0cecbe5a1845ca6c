// ABOUTME: Lock manager: acquire, release, inspect and recover deployment locks per stage.
// ABOUTME: Also fronts the optional Pulumi state lock backend.

use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::applicable::Applicable;
use crate::confirm::Confirm;
use crate::types::{ProjectName, Stage};

use super::{DeploymentLock, LockError, LockStore, StateLockBackend};

/// Current state of a stage's deployment lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "lock", rename_all = "snake_case")]
pub enum LockStatus {
    Free,
    /// Held and unexpired: a deployment is genuinely in progress.
    Active(DeploymentLock),
    /// Held but past `expires_at`: likely left by a crashed run.
    Stale(DeploymentLock),
}

impl LockStatus {
    pub fn lock(&self) -> Option<&DeploymentLock> {
        match self {
            LockStatus::Free => None,
            LockStatus::Active(lock) | LockStatus::Stale(lock) => Some(lock),
        }
    }
}

/// What `release_lock` found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    AlreadyReleased,
    /// The record now belongs to another holder (recovered and re-acquired).
    Superseded { holder_id: String },
}

/// Result of checking the Pulumi state lock during recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PulumiLockCheck {
    NotConfigured,
    Unlocked,
    Cleared { removed: usize },
    /// Locked and the operator declined to clear it.
    Kept,
}

pub struct LockManager {
    project: ProjectName,
    store: LockStore,
    ttl: Duration,
    state_backend: Option<Arc<dyn StateLockBackend>>,
}

impl std::fmt::Debug for LockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockManager")
            .field("project", &self.project)
            .field("store", &self.store)
            .field("ttl", &self.ttl)
            .field("state_backend", &self.state_backend.is_some())
            .finish()
    }
}

impl LockManager {
    pub fn new(project: ProjectName, store: LockStore, ttl: Duration) -> Self {
        Self {
            project,
            store,
            ttl,
            state_backend: None,
        }
    }

    pub fn with_state_backend(mut self, backend: Arc<dyn StateLockBackend>) -> Self {
        self.state_backend = Some(backend);
        self
    }

    pub fn store(&self) -> &LockStore {
        &self.store
    }

    /// Claim `stage` for this process.
    ///
    /// Any existing record blocks acquisition, including an expired one. Stale
    /// locks are only cleared through recovery so a slow but alive deployment
    /// is never preempted.
    pub fn acquire_lock(&self, stage: Stage) -> Result<DeploymentLock, LockError> {
        let lock = DeploymentLock::new(&self.project, stage, self.ttl);
        self.store.create(&lock)?;
        tracing::debug!("acquired {stage} lock until {}", lock.expires_at);
        Ok(lock)
    }

    /// Release a lock previously returned by `acquire_lock`. Idempotent.
    pub fn release_lock(&self, lock: &DeploymentLock) -> Result<ReleaseOutcome, LockError> {
        match self.store.read(lock.stage)? {
            None => Ok(ReleaseOutcome::AlreadyReleased),
            Some(current) if !current.same_claim(lock) => {
                tracing::warn!(
                    "{} lock now held by {}, leaving it in place",
                    lock.stage,
                    current.holder_id
                );
                Ok(ReleaseOutcome::Superseded {
                    holder_id: current.holder_id,
                })
            }
            Some(_) => {
                if self.store.remove(lock.stage)? {
                    tracing::debug!("released {} lock", lock.stage);
                    Ok(ReleaseOutcome::Released)
                } else {
                    Ok(ReleaseOutcome::AlreadyReleased)
                }
            }
        }
    }

    /// Current lock for a stage, if any.
    pub fn get_file_lock(&self, stage: Stage) -> Result<Option<DeploymentLock>, LockError> {
        self.store.read(stage)
    }

    pub fn lock_status(&self, stage: Stage) -> Result<LockStatus, LockError> {
        let now = Utc::now();
        Ok(match self.store.read(stage)? {
            None => LockStatus::Free,
            Some(lock) if lock.is_stale_at(now) => LockStatus::Stale(lock),
            Some(lock) => LockStatus::Active(lock),
        })
    }

    /// Remove the stage's record regardless of holder. Recovery only.
    pub fn force_release(&self, stage: Stage) -> Result<bool, LockError> {
        let removed = self.store.remove(stage)?;
        if removed {
            tracing::warn!("force-released {stage} lock");
        }
        Ok(removed)
    }

    pub async fn is_pulumi_locked(&self, stage: Stage) -> Result<Applicable<bool>, LockError> {
        match &self.state_backend {
            Some(backend) => Ok(Applicable::Applied(backend.is_locked(stage).await?)),
            None => Ok(Applicable::skipped("no Pulumi backend configured")),
        }
    }

    /// Clear the Pulumi state lock. Callers must have confirmed no run is active.
    pub async fn clear_pulumi_lock(&self, stage: Stage) -> Result<Applicable<usize>, LockError> {
        match &self.state_backend {
            Some(backend) => Ok(Applicable::Applied(backend.clear(stage).await?)),
            None => Ok(Applicable::skipped("no Pulumi backend configured")),
        }
    }

    /// Detect a Pulumi state lock and clear it if the operator confirms.
    pub async fn check_and_clean_pulumi_lock(
        &self,
        stage: Stage,
        confirm: &dyn Confirm,
    ) -> Result<PulumiLockCheck, LockError> {
        let locked = match self.is_pulumi_locked(stage).await? {
            Applicable::Skipped(_) => return Ok(PulumiLockCheck::NotConfigured),
            Applicable::Applied(locked) => locked,
        };

        if !locked {
            return Ok(PulumiLockCheck::Unlocked);
        }

        let message = format!(
            "Pulumi state for stack '{stage}' is locked. Clear it? Only do this if no other deployment is running."
        );
        if !confirm.confirm(&message) {
            return Ok(PulumiLockCheck::Kept);
        }

        let removed = self.clear_pulumi_lock(stage).await?.applied().unwrap_or(0);
        Ok(PulumiLockCheck::Cleared { removed })
    }
}
