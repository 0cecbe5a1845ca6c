// ABOUTME: Route 53 hosted zones and record sets.
// ABOUTME: Zone IDs are stripped of the /hostedzone/ prefix and names of their trailing dot.

use async_trait::async_trait;
use serde::Deserialize;

use super::{AwsCli, parse};
use crate::cloud::{CloudError, DnsOps, DnsRecord, HostedZone};
use crate::types::{ZoneId, normalize_domain};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ZonesResponse {
    #[serde(default)]
    hosted_zones: Vec<ZoneSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateZoneResponse {
    hosted_zone: ZoneSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ZoneSummary {
    id: String,
    name: String,
    #[serde(default)]
    resource_record_set_count: Option<u64>,
}

impl From<ZoneSummary> for HostedZone {
    fn from(zone: ZoneSummary) -> Self {
        HostedZone {
            id: ZoneId::new(zone.id.trim_start_matches("/hostedzone/")),
            name: normalize_domain(&zone.name),
            record_count: zone.resource_record_set_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordsResponse {
    #[serde(default)]
    resource_record_sets: Vec<RecordSet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordSet {
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(default)]
    resource_records: Vec<RecordValue>,
    #[serde(default)]
    alias_target: Option<AliasTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct AliasTarget {
    #[serde(rename = "DNSName")]
    dns_name: String,
}

impl From<RecordSet> for DnsRecord {
    fn from(set: RecordSet) -> Self {
        DnsRecord {
            name: normalize_domain(&set.name),
            record_type: set.record_type,
            alias_target: set.alias_target.map(|alias| normalize_domain(&alias.dns_name)),
            values: set
                .resource_records
                .into_iter()
                .map(|record| record.value)
                .collect(),
        }
    }
}

fn parse_records(stdout: &str) -> Result<Vec<DnsRecord>, CloudError> {
    let response: RecordsResponse = parse("route53 list-resource-record-sets", stdout)?;
    Ok(response
        .resource_record_sets
        .into_iter()
        .map(DnsRecord::from)
        .collect())
}

#[async_trait]
impl DnsOps for AwsCli {
    async fn list_zones(&self) -> Result<Vec<HostedZone>, CloudError> {
        let response: ZonesResponse = self
            .call_json(
                "route53 list-hosted-zones",
                &["route53", "list-hosted-zones"],
                None,
            )
            .await?;
        Ok(response.hosted_zones.into_iter().map(HostedZone::from).collect())
    }

    async fn get_dns_records(&self, zone_id: &ZoneId) -> Result<Vec<DnsRecord>, CloudError> {
        let stdout = self
            .call(
                "route53 list-resource-record-sets",
                &[
                    "route53",
                    "list-resource-record-sets",
                    "--hosted-zone-id",
                    zone_id.as_str(),
                ],
                None,
            )
            .await?;
        parse_records(&stdout)
    }

    async fn create_zone(&self, domain: &str) -> Result<HostedZone, CloudError> {
        let domain = normalize_domain(domain);
        let reference = format!("stagecoach-{}", chrono::Utc::now().timestamp_millis());
        let response: CreateZoneResponse = self
            .call_json(
                "route53 create-hosted-zone",
                &[
                    "route53",
                    "create-hosted-zone",
                    "--name",
                    &domain,
                    "--caller-reference",
                    &reference,
                ],
                None,
            )
            .await?;
        Ok(response.hosted_zone.into())
    }

    async fn delete_zone(&self, zone_id: &ZoneId) -> Result<(), CloudError> {
        self.call(
            "route53 delete-hosted-zone",
            &["route53", "delete-hosted-zone", "--id", zone_id.as_str()],
            None,
        )
        .await
        .map(|_| ())
    }
}
