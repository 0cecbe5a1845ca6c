// ABOUTME: Diff command implementation.
// ABOUTME: Prints live infrastructure changes pending for a stage.

use super::load_project;
use stagecoach::deploy::CloudClients;
use stagecoach::error::Result;
use stagecoach::output::{Output, OutputMode};
use stagecoach::reconcile::compute_diff;
use stagecoach::types::Stage;

pub async fn diff(stage: Stage, output: &Output) -> Result<()> {
    let (config, _) = load_project()?;
    let stage_config = config.stage(stage)?;
    let cloud = CloudClients::aws(&config.aws);

    let diff = compute_diff(
        stage,
        stage_config,
        cloud.cdn.as_ref(),
        cloud.certificates.as_ref(),
        cloud.dns.as_ref(),
    )
    .await;

    match output.mode() {
        OutputMode::Json => output.result(&diff),
        OutputMode::Normal | OutputMode::Quiet => print!("{diff}"),
    }
    Ok(())
}
