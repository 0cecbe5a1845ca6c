// ABOUTME: Audit report over every distribution in the account.
// ABOUTME: Partitions analyses by status and renders issue and recommendation lines.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use super::analyzer::{DesiredConfig, DistributionAnalysis, DistributionStatus, analyze};
use crate::cloud::{CloudError, Distribution, DistributionOps, DnsOps, DnsRecord};

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub configured: Vec<DistributionAnalysis>,
    pub orphaned: Vec<DistributionAnalysis>,
    pub misconfigured: Vec<DistributionAnalysis>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AuditReport {
    pub fn total(&self) -> usize {
        self.configured.len() + self.orphaned.len() + self.misconfigured.len()
    }

    /// No orphaned or misconfigured distributions.
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty() && self.misconfigured.is_empty()
    }

    pub fn analyses(&self) -> impl Iterator<Item = &DistributionAnalysis> {
        self.configured
            .iter()
            .chain(&self.orphaned)
            .chain(&self.misconfigured)
    }

    /// Analyses cleanup is allowed to offer for deletion.
    pub fn deletable(&self) -> Vec<DistributionAnalysis> {
        self.analyses().filter(|a| a.can_delete()).cloned().collect()
    }
}

/// Analyze every distribution and summarize. Performs no mutation.
pub fn generate_audit_report(
    distributions: &[Distribution],
    desired: &DesiredConfig,
    dns_records: &[DnsRecord],
    now: DateTime<Utc>,
) -> AuditReport {
    let mut configured = Vec::new();
    let mut orphaned = Vec::new();
    let mut misconfigured = Vec::new();

    for distribution in distributions {
        let analysis = analyze(distribution, desired, dns_records, now);
        match analysis.status {
            DistributionStatus::Configured => configured.push(analysis),
            DistributionStatus::Orphaned => orphaned.push(analysis),
            DistributionStatus::Misconfigured => misconfigured.push(analysis),
        }
    }

    let mut issues = Vec::new();
    let mut recommendations = Vec::new();
    for analysis in misconfigured.iter().chain(&orphaned) {
        issues.push(format!(
            "[{}] {} ({}) {}: {}",
            analysis.severity,
            analysis.id,
            analysis.domain,
            analysis.status,
            analysis.reasons.join("; ")
        ));
        for recommendation in &analysis.recommendations {
            recommendations.push(format!("{}: {recommendation}", analysis.id));
        }
    }

    let deletable = orphaned
        .iter()
        .chain(&misconfigured)
        .filter(|a| a.can_delete())
        .count();
    if deletable > 0 {
        recommendations.push(format!(
            "{deletable} distribution(s) can be removed with `stagecoach audit --cleanup`"
        ));
    }

    AuditReport {
        generated_at: now,
        configured,
        orphaned,
        misconfigured,
        issues,
        recommendations,
    }
}

/// Records from every hosted zone, fetched concurrently.
pub async fn fetch_all_dns_records(dns: &dyn DnsOps) -> Result<Vec<DnsRecord>, CloudError> {
    let zones = dns.list_zones().await?;
    let results = join_all(zones.iter().map(|zone| dns.get_dns_records(&zone.id))).await;

    let mut records = Vec::new();
    for result in results {
        records.extend(result?);
    }
    Ok(records)
}

/// Fetch live state and build the audit report.
pub async fn run_audit(
    cdn: &dyn DistributionOps,
    dns: &dyn DnsOps,
    desired: &DesiredConfig,
    now: DateTime<Utc>,
) -> Result<AuditReport, CloudError> {
    let (distributions, records) =
        tokio::try_join!(cdn.list_distributions(), fetch_all_dns_records(dns))?;
    Ok(generate_audit_report(&distributions, desired, &records, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DistributionId;

    fn distribution(id: &str, domain: &str, origin: &str, aliases: &[&str]) -> Distribution {
        Distribution {
            id: DistributionId::new(id),
            domain_name: domain.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            origins: vec![origin.into()],
            enabled: true,
            status: "Deployed".into(),
            price_class: None,
            certificate_arn: None,
            created_time: None,
            last_modified_time: None,
        }
    }

    #[test]
    fn report_partitions_by_status() {
        let desired = DesiredConfig::new(["example.com"], "placeholder.sst.dev");
        let distributions = vec![
            distribution("EAAAAAAAAAA", "a.cloudfront.net", "bucket", &["example.com"]),
            distribution("EBBBBBBBBBB", "b.cloudfront.net", "bucket", &[]),
            distribution("ECCCCCCCCCC", "c.cloudfront.net", "placeholder.sst.dev", &["example.com"]),
        ];

        let report = generate_audit_report(&distributions, &desired, &[], Utc::now());
        assert_eq!(report.configured.len(), 1);
        assert_eq!(report.orphaned.len(), 1);
        assert_eq!(report.misconfigured.len(), 1);
        assert_eq!(report.total(), 3);
        assert!(!report.is_clean());
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.deletable().len(), 2);
        assert!(
            report
                .recommendations
                .last()
                .is_some_and(|line| line.contains("audit --cleanup"))
        );
    }

    #[test]
    fn empty_account_is_clean() {
        let desired = DesiredConfig::new(["example.com"], "placeholder.sst.dev");
        let report = generate_audit_report(&[], &desired, &[], Utc::now());
        assert!(report.is_clean());
        assert!(report.recommendations.is_empty());
    }
}
