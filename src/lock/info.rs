// ABOUTME: The persisted deployment lock record and holder identity.
// ABOUTME: Staleness is derived from expires_at and never enforced here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProjectName, Stage};

/// An exclusive claim on a (project, stage) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentLock {
    pub project: String,
    pub stage: Stage,
    /// Opaque `host:pid` identifier of the holding process.
    pub holder_id: String,
    pub holder_host: String,
    pub holder_pid: u32,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DeploymentLock {
    /// Create a lock record for the current process, acquired now.
    pub fn new(project: &ProjectName, stage: Stage, ttl: Duration) -> Self {
        Self::new_at(project, stage, ttl, Utc::now())
    }

    pub fn new_at(project: &ProjectName, stage: Stage, ttl: Duration, now: DateTime<Utc>) -> Self {
        let holder_host = gethostname::gethostname().to_string_lossy().into_owned();
        let holder_pid = std::process::id();
        Self {
            project: project.to_string(),
            stage,
            holder_id: format!("{holder_host}:{holder_pid}"),
            holder_host,
            holder_pid,
            acquired_at: now,
            expires_at: now + ttl,
        }
    }

    /// Stale iff the current time is past `expires_at`.
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Time held so far.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.acquired_at
    }

    /// Whether `other` is the same claim (same holder, same acquisition).
    pub fn same_claim(&self, other: &DeploymentLock) -> bool {
        self.holder_id == other.holder_id && self.acquired_at == other.acquired_at
    }
}
