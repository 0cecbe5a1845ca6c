// ABOUTME: Observation and clearing of the Pulumi state lock.
// ABOUTME: The orchestrator never creates this lock; it only detects orphans left by crashed runs.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::types::Stage;

use super::LockError;

/// Lock held by the delegated infrastructure tool.
#[async_trait]
pub trait StateLockBackend: Send + Sync {
    /// Whether the stack for `stage` currently holds a state lock.
    async fn is_locked(&self, stage: Stage) -> Result<bool, LockError>;

    /// Remove the state lock for `stage`. Returns how many lock entries were removed.
    async fn clear(&self, stage: Stage) -> Result<usize, LockError>;
}

/// Pulumi self-managed (file) backend.
///
/// Lock files live under `<backend>/.pulumi/locks/organization/<project>/<stack>/`
/// for project-scoped backends and `<backend>/.pulumi/locks/<stack>/` for legacy ones.
#[derive(Debug, Clone)]
pub struct PulumiFileBackend {
    backend_dir: PathBuf,
    project: String,
}

impl PulumiFileBackend {
    pub fn new(backend_dir: impl Into<PathBuf>, project: impl Into<String>) -> Self {
        Self {
            backend_dir: backend_dir.into(),
            project: project.into(),
        }
    }

    /// Candidate lock directories for a stack, project-scoped first.
    pub fn lock_dirs(&self, stage: Stage) -> [PathBuf; 2] {
        let locks = self.backend_dir.join(".pulumi").join("locks");
        [
            locks
                .join("organization")
                .join(&self.project)
                .join(stage.as_str()),
            locks.join(stage.as_str()),
        ]
    }

    async fn lock_files(&self, stage: Stage) -> Result<Vec<PathBuf>, LockError> {
        let mut files = Vec::new();
        for dir in self.lock_dirs(stage) {
            files.extend(json_files_in(&dir).await?);
        }
        Ok(files)
    }
}

async fn json_files_in(dir: &Path) -> Result<Vec<PathBuf>, LockError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(LockError::io(dir, err)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LockError::io(dir, e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(files)
}

#[async_trait]
impl StateLockBackend for PulumiFileBackend {
    async fn is_locked(&self, stage: Stage) -> Result<bool, LockError> {
        Ok(!self.lock_files(stage).await?.is_empty())
    }

    async fn clear(&self, stage: Stage) -> Result<usize, LockError> {
        let mut removed = 0;
        for path in self.lock_files(stage).await? {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::warn!("removed Pulumi state lock {}", path.display());
                    removed += 1;
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(LockError::io(&path, err)),
            }
        }
        Ok(removed)
    }
}
