// ABOUTME: Deploy command implementation.
// ABOUTME: Runs the stage pipeline and reports its result, warnings and recovery steps.

use super::load_project;
use stagecoach::deploy::{self, DeployContext, DeployOptions, PipelineFailure};
use stagecoach::error::{Error, Result};
use stagecoach::output::Output;
use stagecoach::types::Stage;

pub async fn deploy(stage: Stage, options: DeployOptions, mut output: Output) -> Result<()> {
    let (config, root) = load_project()?;
    config.stage(stage)?;

    output.start_timer();
    output.progress(&format!(
        "Deploying {} to {stage}{}",
        config.project,
        if options.dry_run { " (dry run)" } else { "" }
    ));

    let ctx = DeployContext::for_project(config, &root)?;
    match deploy::run(&ctx, stage, options, &output).await {
        Ok(result) => {
            for warning in &result.warnings {
                output.warning(&warning.message);
            }
            if let Some(id) = &result.distribution_id {
                output.progress(&format!("  Distribution: {id}"));
            }
            output.result(&result);
            if options.dry_run {
                output.success(&format!("Dry run for {stage} complete"));
            } else {
                output.success(&format!("Deployed to {stage}"));
            }
            Ok(())
        }
        Err(failure) => {
            let PipelineFailure { error, result } = *failure;
            for warning in &result.warnings {
                output.warning(&warning.message);
            }
            output.result(&result);
            output.recovery(&error.recovery_hint(stage));
            Err(Error::Deploy(error))
        }
    }
}
