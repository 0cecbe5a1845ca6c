// ABOUTME: Audit command implementation.
// ABOUTME: Classifies every distribution and optionally deletes confirmed orphans.

use super::load_project;
use chrono::Utc;
use stagecoach::confirm::confirmer;
use stagecoach::deploy::CloudClients;
use stagecoach::error::{Error, Result};
use stagecoach::output::Output;
use stagecoach::reconcile::{AuditReport, DesiredConfig, cleanup_distributions, run_audit};

pub async fn audit(cleanup: bool, yes: bool, output: &Output) -> Result<()> {
    let (config, _) = load_project()?;
    let cloud = CloudClients::aws(&config.aws);
    let desired = DesiredConfig::from_config(&config);

    let report = run_audit(cloud.cdn.as_ref(), cloud.dns.as_ref(), &desired, Utc::now()).await?;
    print_report(&report, output);
    output.result(&report);

    if !cleanup {
        return Ok(());
    }

    let deletable = report.deletable();
    if deletable.is_empty() {
        output.success("Nothing to clean up");
        return Ok(());
    }

    let confirm = confirmer(yes);
    let result = cleanup_distributions(cloud.cdn.as_ref(), &deletable, confirm.as_ref()).await;
    for id in &result.deleted {
        output.progress(&format!("Deleted {id}"));
    }
    for (id, reason) in &result.failed {
        output.warning(&format!("Could not delete {id}: {reason}"));
    }
    output.result(&result);

    if result.has_failures() {
        return Err(Error::Incomplete(format!(
            "{} distribution(s) could not be deleted",
            result.failed.len()
        )));
    }
    output.success(&format!("Deleted {} distribution(s)", result.deleted.len()));
    Ok(())
}

fn print_report(report: &AuditReport, output: &Output) {
    output.progress(&format!(
        "{} distribution(s): {} configured, {} orphaned, {} misconfigured",
        report.total(),
        report.configured.len(),
        report.orphaned.len(),
        report.misconfigured.len()
    ));
    for analysis in report.analyses() {
        output.progress(&format!(
            "  [{}] {} {} ({})",
            analysis.severity, analysis.id, analysis.domain, analysis.status
        ));
    }
    for issue in &report.issues {
        output.progress(&format!("  ! {issue}"));
    }
    for recommendation in &report.recommendations {
        output.progress(&format!("  → {recommendation}"));
    }
}
