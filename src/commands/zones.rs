// ABOUTME: Zone commands: create a tracked hosted zone, list and clean stale ones.
// ABOUTME: Only zones recorded in the tracking file are ever considered for deletion.

use super::load_project;
use chrono::{TimeDelta, Utc};
use stagecoach::confirm::confirmer;
use stagecoach::deploy::CloudClients;
use stagecoach::error::{Error, Result};
use stagecoach::output::Output;
use stagecoach::zones::{
    ZoneTracker, collect_tracked_records, create_tracked_zone, delete_stale_zones,
    find_stale_zones,
};

pub async fn zones_create(domain: &str, output: &Output) -> Result<()> {
    let (config, root) = load_project()?;
    let cloud = CloudClients::aws(&config.aws);
    let mut tracker = ZoneTracker::for_project_root(&root)?;

    let zone = create_tracked_zone(
        cloud.dns.as_ref(),
        &mut tracker,
        domain,
        config.project.as_str(),
    )
    .await?;
    output.result(&zone);
    output.success(&format!("Created hosted zone {} ({})", zone.name, zone.id));
    Ok(())
}

pub async fn zones_stale(cleanup: bool, yes: bool, output: &Output) -> Result<()> {
    let (config, root) = load_project()?;
    let stale_after = TimeDelta::from_std(config.zones.stale_after)
        .map_err(|e| Error::InvalidConfig(format!("zones.stale_after: {e}")))?;
    let cloud = CloudClients::aws(&config.aws);
    let mut tracker = ZoneTracker::for_project_root(&root)?;

    let zones = cloud.dns.list_zones().await?;
    let records = collect_tracked_records(cloud.dns.as_ref(), &zones, &tracker).await;
    let stale = find_stale_zones(&zones, &tracker, &records, stale_after, Utc::now());

    if stale.is_empty() {
        output.success("No stale hosted zones");
        return Ok(());
    }
    for zone in &stale {
        output.progress(&format!(
            "  {} ({}) created {} days ago, no records",
            zone.zone.name, zone.zone.id, zone.age_days
        ));
    }
    output.result(&stale);

    if !cleanup {
        return Ok(());
    }

    let confirm = confirmer(yes);
    let result = delete_stale_zones(
        cloud.dns.as_ref(),
        &mut tracker,
        &stale,
        stale_after,
        confirm.as_ref(),
    )
    .await;
    for (name, reason) in &result.failed {
        output.warning(&format!("Could not delete {name}: {reason}"));
    }
    output.result(&result);

    if !result.failed.is_empty() {
        return Err(Error::Incomplete(format!(
            "{} zone(s) could not be deleted",
            result.failed.len()
        )));
    }
    output.success(&format!("Deleted {} hosted zone(s)", result.deleted.len()));
    Ok(())
}
