// ABOUTME: Recover command implementation.
// ABOUTME: Clears stale deployment and Pulumi locks after operator confirmation.

use super::load_project;
use stagecoach::confirm::confirmer;
use stagecoach::deploy::{self, LockRecovery, lock_manager};
use stagecoach::error::{Error, Result};
use stagecoach::lock::PulumiLockCheck;
use stagecoach::output::Output;
use stagecoach::types::Stage;

pub async fn recover(stage: Stage, yes: bool, output: &Output) -> Result<()> {
    let (config, root) = load_project()?;
    config.stage(stage)?;
    let locks = lock_manager(&config, &root);
    let confirm = confirmer(yes);

    let report = deploy::recover(&locks, stage, confirm.as_ref()).await?;

    match &report.lock {
        LockRecovery::NotLocked => output.progress(&format!("{stage} has no deployment lock")),
        LockRecovery::ClearedStale(lock) | LockRecovery::ClearedActive(lock) => {
            output.progress(&format!("Cleared {stage} lock held by {}", lock.holder_id))
        }
        LockRecovery::Kept(lock) => {
            output.progress(&format!("Kept {stage} lock held by {}", lock.holder_id))
        }
    }
    match &report.pulumi {
        PulumiLockCheck::NotConfigured | PulumiLockCheck::Unlocked => {}
        PulumiLockCheck::Cleared { removed } => {
            output.progress(&format!("Removed {removed} Pulumi lock file(s)"))
        }
        PulumiLockCheck::Kept => output.progress("Kept Pulumi state lock"),
    }
    output.result(&report);

    if report.stage_unblocked() {
        output.success(&format!("{stage} is ready to deploy"));
        Ok(())
    } else {
        Err(Error::Incomplete(format!("{stage} is still locked")))
    }
}
