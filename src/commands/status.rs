// ABOUTME: Status command implementation.
// ABOUTME: Reports the deployment lock and Pulumi state lock for each stage.

use super::load_project;
use serde::Serialize;
use stagecoach::applicable::Applicable;
use stagecoach::deploy::lock_manager;
use stagecoach::error::Result;
use stagecoach::lock::LockStatus;
use stagecoach::output::Output;
use stagecoach::types::Stage;

#[derive(Serialize)]
struct StageStatus {
    stage: Stage,
    lock: LockStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pulumi_locked: Option<bool>,
}

pub async fn status(stage: Option<Stage>, output: &Output) -> Result<()> {
    let (config, root) = load_project()?;
    let stages: Vec<Stage> = match stage {
        Some(stage) => {
            config.stage(stage)?;
            vec![stage]
        }
        None => config.stages.keys().copied().collect(),
    };
    let locks = lock_manager(&config, &root);

    for stage in stages {
        let lock = locks.lock_status(stage)?;
        let pulumi_locked = match locks.is_pulumi_locked(stage).await? {
            Applicable::Applied(locked) => Some(locked),
            Applicable::Skipped(_) => None,
        };

        match &lock {
            LockStatus::Free => output.progress(&format!("{stage}: free")),
            LockStatus::Active(lock) => output.progress(&format!(
                "{stage}: locked by {} since {}, expires {}",
                lock.holder_id,
                lock.acquired_at.format("%Y-%m-%d %H:%M:%S UTC"),
                lock.expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
            )),
            LockStatus::Stale(lock) => output.progress(&format!(
                "{stage}: stale lock from {} (expired {}), run `stagecoach recover {stage}`",
                lock.holder_id,
                lock.expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
            )),
        }
        if pulumi_locked == Some(true) {
            output.progress(&format!("{stage}: Pulumi state is locked"));
        }

        output.result(&StageStatus {
            stage,
            lock,
            pulumi_locked,
        });
    }

    Ok(())
}
