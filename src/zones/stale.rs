// ABOUTME: Stale zone detection and tracked zone creation/deletion.
// ABOUTME: Only zones this tool created, older than the threshold and empty, are candidates.

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;

use super::{ZoneError, ZoneTracker};
use crate::cloud::{DnsOps, DnsRecord, HostedZone};
use crate::confirm::Confirm;
use crate::types::{ZoneId, domains_match};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleZone {
    pub zone: HostedZone,
    pub created_at: DateTime<Utc>,
    pub age_days: i64,
}

/// Zones that are tracked, older than `stale_after`, and hold only NS/SOA records.
///
/// A zone missing from `records_by_zone` is not flagged. Losing the tracking
/// file hides every zone from this check.
pub fn find_stale_zones(
    zones: &[HostedZone],
    tracker: &ZoneTracker,
    records_by_zone: &HashMap<ZoneId, Vec<DnsRecord>>,
    stale_after: TimeDelta,
    now: DateTime<Utc>,
) -> Vec<StaleZone> {
    zones
        .iter()
        .filter_map(|zone| {
            let record = tracker.get(&zone.name)?;
            if record.zone_id != zone.id {
                return None;
            }
            let age = now - record.created_at;
            if age <= stale_after {
                return None;
            }
            let records = records_by_zone.get(&zone.id)?;
            if !records.iter().all(DnsRecord::is_zone_apex_record) {
                return None;
            }
            Some(StaleZone {
                zone: zone.clone(),
                created_at: record.created_at,
                age_days: age.num_days(),
            })
        })
        .collect()
}

/// Record sets for each tracked zone, fetched concurrently. Failed fetches are left out.
pub async fn collect_tracked_records(
    dns: &dyn DnsOps,
    zones: &[HostedZone],
    tracker: &ZoneTracker,
) -> HashMap<ZoneId, Vec<DnsRecord>> {
    let tracked: Vec<&HostedZone> = zones
        .iter()
        .filter(|zone| tracker.get(&zone.name).is_some())
        .collect();
    let results = join_all(tracked.iter().map(|zone| dns.get_dns_records(&zone.id))).await;

    tracked
        .into_iter()
        .zip(results)
        .filter_map(|(zone, result)| match result {
            Ok(records) => Some((zone.id.clone(), records)),
            Err(e) => {
                tracing::warn!("could not read records for zone {}: {e}", zone.name);
                None
            }
        })
        .collect()
}

/// Create a hosted zone and start tracking it.
pub async fn create_tracked_zone(
    dns: &dyn DnsOps,
    tracker: &mut ZoneTracker,
    domain: &str,
    project_name: &str,
) -> Result<HostedZone, ZoneError> {
    let existing = dns.list_zones().await?;
    if let Some(zone) = existing.iter().find(|z| domains_match(&z.name, domain)) {
        return Err(ZoneError::AlreadyExists {
            domain: zone.name.clone(),
            zone_id: zone.id.clone(),
        });
    }

    let zone = dns.create_zone(domain).await?;
    tracker.record(&zone.name, zone.id.clone(), project_name, Utc::now())?;
    tracing::info!("created hosted zone {} ({})", zone.name, zone.id);
    Ok(zone)
}

#[derive(Debug, Default, Serialize)]
pub struct ZoneCleanupResult {
    pub deleted: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Delete confirmed stale zones and forget them.
pub async fn delete_stale_zones(
    dns: &dyn DnsOps,
    tracker: &mut ZoneTracker,
    stale: &[StaleZone],
    min_age: TimeDelta,
    confirm: &dyn Confirm,
) -> ZoneCleanupResult {
    let mut result = ZoneCleanupResult::default();
    let now = Utc::now();

    for candidate in stale {
        let name = &candidate.zone.name;
        if tracker.is_too_young(name, min_age, now) {
            result.skipped.push(name.clone());
            continue;
        }
        let message = format!(
            "Delete empty hosted zone {name} ({}, created {} days ago)?",
            candidate.zone.id, candidate.age_days
        );
        if !confirm.confirm(&message) {
            result.skipped.push(name.clone());
            continue;
        }

        match dns.delete_zone(&candidate.zone.id).await {
            Ok(()) => {
                if let Err(e) = tracker.remove(name) {
                    tracing::warn!("deleted {name} but could not update tracker: {e}");
                }
                result.deleted.push(name.clone());
            }
            Err(e) => result.failed.push((name.clone(), e.to_string())),
        }
    }

    result
}
