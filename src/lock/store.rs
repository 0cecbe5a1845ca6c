// ABOUTME: File-backed lock store, one JSON record per stage.
// ABOUTME: Uses create-if-absent file creation so racing acquirers cannot both win.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::STATE_DIR;
use crate::types::Stage;

use super::{DeploymentLock, LockError};

/// Durable lock records under `<project root>/.stagecoach/locks/`.
#[derive(Debug, Clone)]
pub struct LockStore {
    dir: PathBuf,
}

impl LockStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_project_root(root: &Path) -> Self {
        Self::new(root.join(STATE_DIR).join("locks"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn lock_path(&self, stage: Stage) -> PathBuf {
        self.dir.join(format!("{stage}.lock"))
    }

    /// Atomically create the record for `lock.stage`.
    ///
    /// Fails with a contention error when any record already exists, stale or not.
    pub fn create(&self, lock: &DeploymentLock) -> Result<(), LockError> {
        fs::create_dir_all(&self.dir).map_err(|e| LockError::io(&self.dir, e))?;

        let path = self.lock_path(lock.stage);
        let json = serde_json::to_vec_pretty(lock).map_err(LockError::Serialize)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(self.contention_error(lock.stage, &path));
            }
            Err(err) => return Err(LockError::io(&path, err)),
        };

        let written = file.write_all(&json).and_then(|_| file.sync_all());
        if let Err(err) = written {
            // Leave no half-written claim behind.
            let _ = fs::remove_file(&path);
            return Err(LockError::io(&path, err));
        }

        tracing::debug!("created lock {} for {}", path.display(), lock.holder_id);
        Ok(())
    }

    fn contention_error(&self, stage: Stage, path: &Path) -> LockError {
        match self.read(stage) {
            Ok(Some(existing)) => LockError::Held {
                lock: Box::new(existing),
            },
            _ => LockError::HeldUnreadable {
                stage,
                path: path.to_path_buf(),
            },
        }
    }

    /// Read the record for a stage, if any. Never mutates.
    pub fn read(&self, stage: Stage) -> Result<Option<DeploymentLock>, LockError> {
        let path = self.lock_path(stage);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(LockError::io(&path, err)),
        };

        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|source| LockError::Corrupt { path, source })
    }

    /// Remove the record for a stage. Returns whether a file was removed.
    pub fn remove(&self, stage: Stage) -> Result<bool, LockError> {
        let path = self.lock_path(stage);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(LockError::io(&path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectName;
    use chrono::Duration;

    fn lock(stage: Stage) -> DeploymentLock {
        DeploymentLock::new(&ProjectName::new("site").unwrap(), stage, Duration::minutes(30))
    }

    #[test]
    fn lock_path_is_per_stage() {
        let store = LockStore::for_project_root(Path::new("/srv/site"));
        assert_eq!(
            store.lock_path(Stage::Staging),
            PathBuf::from("/srv/site/.stagecoach/locks/staging.lock")
        );
    }

    #[test]
    fn create_then_read_returns_same_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = LockStore::new(dir.path());
        let record = lock(Stage::Staging);

        store.create(&record).unwrap();
        assert_eq!(store.read(Stage::Staging).unwrap(), Some(record));
        assert_eq!(store.read(Stage::Production).unwrap(), None);
    }

    #[test]
    fn second_create_reports_existing_holder() {
        let dir = tempfile::tempdir().unwrap();
        let store = LockStore::new(dir.path());
        let first = lock(Stage::Production);
        store.create(&first).unwrap();

        let err = store.create(&lock(Stage::Production)).unwrap_err();
        assert!(err.is_contention());
        assert_eq!(err.holder(), Some(&first));
    }

    #[test]
    fn garbage_lock_file_still_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let store = LockStore::new(dir.path());
        fs::write(store.lock_path(Stage::Staging), b"{not json").unwrap();

        let err = store.create(&lock(Stage::Staging)).unwrap_err();
        assert!(matches!(err, LockError::HeldUnreadable { .. }));
        assert!(matches!(
            store.read(Stage::Staging),
            Err(LockError::Corrupt { .. })
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LockStore::new(dir.path());
        store.create(&lock(Stage::Staging)).unwrap();

        assert!(store.remove(Stage::Staging).unwrap());
        assert!(!store.remove(Stage::Staging).unwrap());
    }
}
