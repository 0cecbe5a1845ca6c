// ABOUTME: Drives a deployment through every phase and routes failures into cleanup.
// ABOUTME: Progress goes to Output; the outcome is a PipelineResult either way.

use super::context::DeployContext;
use super::deployment::{DeployOptions, Deployment};
use super::result::PipelineResult;
use super::transitions::PipelineFailure;
use crate::output::Output;
use crate::types::Stage;

/// Run the full pipeline for `stage`.
///
/// Preflight and lock contention fail without side effects. Any later
/// failure restores maintenance routing and releases the lock before
/// returning.
pub async fn run(
    ctx: &DeployContext,
    stage: Stage,
    options: DeployOptions,
    output: &Output,
) -> Result<PipelineResult, Box<PipelineFailure>> {
    let deployment = Deployment::new(stage, options);

    output.progress("  → Running preflight checks...");
    let mut deployment = match deployment.run_preflight(ctx).await {
        Ok(d) => d,
        Err((d, e)) => return Err(Box::new(d.fail(ctx, e).await)),
    };

    if options.show_diff {
        output.progress("  → Comparing live infrastructure...");
        match deployment.preview_diff(ctx).await {
            Ok(diff) => output.progress(&diff.to_string()),
            Err(e) => return Err(Box::new(deployment.fail(ctx, e).await)),
        }
    }

    if !options.dry_run {
        output.progress("  → Acquiring deploy lock...");
    }
    let deployment = match deployment.acquire_lock(ctx).await {
        Ok(d) => d,
        Err((d, e)) => return Err(Box::new(d.fail(ctx, e).await)),
    };

    output.progress("  → Building...");
    let deployment = match deployment.build(ctx).await {
        Ok(d) => d,
        Err((d, e)) => return Err(Box::new(d.fail(ctx, e).await)),
    };

    if options.maintenance && !options.dry_run {
        output.progress("  → Enabling maintenance page...");
    }
    output.progress(if options.dry_run {
        "  → Previewing deploy..."
    } else {
        "  → Deploying..."
    });
    let deployment = match deployment.deploy(ctx).await {
        Ok(d) => d,
        Err((d, e)) => return Err(Box::new(d.fail(ctx, e).await)),
    };

    output.progress("  → Validating health...");
    let deployment = match deployment.validate_health(ctx).await {
        Ok(d) => d,
        Err((d, e)) => {
            output.progress(&format!("  ✗ {e}"));
            return Err(Box::new(d.fail(ctx, e).await));
        }
    };

    let deployment = match deployment.release(ctx).await {
        Ok(d) => d,
        Err((d, e)) => return Err(Box::new(d.fail(ctx, e).await)),
    };

    if !options.dry_run {
        output.progress("  → Invalidating CDN cache...");
    }
    let deployment = deployment.invalidate_cache(ctx).await;

    output.progress("  → Auditing distributions...");
    let deployment = deployment.audit(ctx).await;

    Ok(deployment.finish())
}
