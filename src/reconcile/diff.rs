// ABOUTME: Field-level diff between a stage's desired config and live CDN, certificate and DNS state.
// ABOUTME: A failed fetch marks only that section unavailable.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::cloud::{
    Certificate, CertificateOps, CloudError, Distribution, DistributionOps, DnsOps, DnsRecord,
    HostedZone, find_zone_for,
};
use crate::config::StageConfig;
use crate::types::{CertificateArn, DistributionId, Stage, domains_match, normalize_domain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

/// One differing field. `current`/`desired` are display values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub kind: ChangeKind,
    pub current: Option<String>,
    pub desired: Option<String>,
}

impl FieldChange {
    fn added(field: impl Into<String>, desired: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: ChangeKind::Added,
            current: None,
            desired: Some(desired.into()),
        }
    }

    fn removed(field: impl Into<String>, current: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: ChangeKind::Removed,
            current: Some(current.into()),
            desired: None,
        }
    }

    fn changed(
        field: impl Into<String>,
        current: impl Into<String>,
        desired: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            kind: ChangeKind::Changed,
            current: Some(current.into()),
            desired: Some(desired.into()),
        }
    }
}

/// Changed/added/removed counts over a list of field changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCounts {
    pub changed: usize,
    pub added: usize,
    pub removed: usize,
}

impl ChangeCounts {
    pub fn of(changes: &[FieldChange]) -> Self {
        changes.iter().fold(Self::default(), |mut counts, change| {
            match change.kind {
                ChangeKind::Added => counts.added += 1,
                ChangeKind::Removed => counts.removed += 1,
                ChangeKind::Changed => counts.changed += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.changed + self.added + self.removed
    }
}

/// A diff section that may have failed to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "availability", rename_all = "lowercase")]
pub enum DiffSection<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> DiffSection<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            DiffSection::Available(diff) => Some(diff),
            DiffSection::Unavailable { .. } => None,
        }
    }

    fn unavailable(error: &CloudError) -> Self {
        DiffSection::Unavailable {
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CdnDiff {
    pub distribution_id: Option<DistributionId>,
    pub changes: Vec<FieldChange>,
    pub counts: ChangeCounts,
    pub identical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateDiff {
    pub certificate_arn: Option<CertificateArn>,
    /// Domains the stage needs that the certificate does not cover.
    pub domains_added: Vec<String>,
    /// Domains the certificate covers that the stage no longer uses.
    pub domains_removed: Vec<String>,
    pub counts: ChangeCounts,
    pub identical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsDiff {
    pub zone: Option<String>,
    pub changes: Vec<FieldChange>,
    pub counts: ChangeCounts,
    pub identical: bool,
}

/// Informational context shown alongside the diff. Never counts as a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InfraSummary {
    pub distribution_id: Option<DistributionId>,
    pub distribution_domain: Option<String>,
    pub distribution_status: Option<String>,
    pub hosted_zone: Option<String>,
    pub certificate_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentDiff {
    pub stage: Stage,
    pub cdn: DiffSection<CdnDiff>,
    pub certificate: DiffSection<CertificateDiff>,
    pub dns: DiffSection<DnsDiff>,
    pub summary: InfraSummary,
    pub has_changes: bool,
}

impl std::fmt::Display for FieldChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current.as_deref().unwrap_or("-");
        let desired = self.desired.as_deref().unwrap_or("-");
        match self.kind {
            ChangeKind::Added => write!(f, "+ {}: {desired}", self.field),
            ChangeKind::Removed => write!(f, "- {}: {current}", self.field),
            ChangeKind::Changed => write!(f, "~ {}: {current} -> {desired}", self.field),
        }
    }
}

fn write_section<T>(
    f: &mut std::fmt::Formatter<'_>,
    title: &str,
    section: &DiffSection<T>,
    lines: impl Fn(&T) -> Vec<String>,
) -> std::fmt::Result {
    match section {
        DiffSection::Unavailable { reason } => writeln!(f, "  {title}: unavailable ({reason})"),
        DiffSection::Available(diff) => {
            let lines = lines(diff);
            if lines.is_empty() {
                writeln!(f, "  {title}: no changes")
            } else {
                writeln!(f, "  {title}:")?;
                lines.iter().try_for_each(|line| writeln!(f, "    {line}"))
            }
        }
    }
}

impl std::fmt::Display for DeploymentDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Infrastructure diff for {}:", self.stage)?;
        write_section(f, "CDN", &self.cdn, |d| {
            d.changes.iter().map(ToString::to_string).collect()
        })?;
        write_section(f, "Certificate", &self.certificate, |d| {
            let mut lines: Vec<String> = Vec::new();
            if d.certificate_arn.is_none() {
                lines.push("no certificate covers the stage domain".to_string());
            }
            lines.extend(d.domains_added.iter().map(|domain| format!("+ {domain}")));
            lines.extend(d.domains_removed.iter().map(|domain| format!("- {domain}")));
            lines
        })?;
        write_section(f, "DNS", &self.dns, |d| {
            d.changes.iter().map(ToString::to_string).collect()
        })?;

        if let Some(id) = &self.summary.distribution_id {
            let status = self.summary.distribution_status.as_deref().unwrap_or("unknown");
            writeln!(f, "  Distribution {id} ({status})")?;
        }
        if let Some(zone) = &self.summary.hosted_zone {
            writeln!(f, "  Hosted zone {zone}")?;
        }
        write!(
            f,
            "  {}",
            if self.has_changes {
                "Changes pending"
            } else {
                "Live infrastructure matches config"
            }
        )
    }
}

/// The distribution currently answering for the stage's domains.
pub fn find_stage_distribution<'a>(
    distributions: &'a [Distribution],
    stage_config: &StageConfig,
) -> Option<&'a Distribution> {
    let domains = stage_config.domains();
    distributions
        .iter()
        .find(|dist| dist.serves(&domains[0]))
        .or_else(|| {
            distributions
                .iter()
                .find(|dist| domains.iter().any(|domain| dist.serves(domain)))
        })
}

pub fn diff_cdn(current: Option<&Distribution>, stage_config: &StageConfig) -> CdnDiff {
    let desired: BTreeSet<String> = stage_config.domains().into_iter().collect();
    let mut changes = Vec::new();

    match current {
        None => {
            changes.extend(desired.iter().map(|alias| FieldChange::added("aliases", alias)));
            changes.push(FieldChange::added("enabled", "true"));
            if let Some(price_class) = &stage_config.price_class {
                changes.push(FieldChange::added("price_class", price_class));
            }
        }
        Some(dist) => {
            let live: BTreeSet<String> = dist.aliases.iter().map(|a| normalize_domain(a)).collect();
            changes.extend(
                desired
                    .difference(&live)
                    .map(|alias| FieldChange::added("aliases", alias)),
            );
            changes.extend(
                live.difference(&desired)
                    .map(|alias| FieldChange::removed("aliases", alias)),
            );
            if !dist.enabled {
                changes.push(FieldChange::changed("enabled", "false", "true"));
            }
            if let Some(price_class) = &stage_config.price_class {
                match &dist.price_class {
                    None => changes.push(FieldChange::added("price_class", price_class)),
                    Some(live) if live != price_class => {
                        changes.push(FieldChange::changed("price_class", live, price_class))
                    }
                    Some(_) => {}
                }
            }
        }
    }

    let counts = ChangeCounts::of(&changes);
    CdnDiff {
        distribution_id: current.map(|d| d.id.clone()),
        identical: changes.is_empty(),
        changes,
        counts,
    }
}

/// Certificate attached to the distribution, else any issued one covering the primary domain.
pub fn select_certificate<'a>(
    certificates: &'a [Certificate],
    distribution: Option<&Distribution>,
    stage_config: &StageConfig,
) -> Option<&'a Certificate> {
    let attached = distribution
        .and_then(|d| d.certificate_arn.as_ref())
        .and_then(|arn| certificates.iter().find(|cert| &cert.arn == arn));
    attached.or_else(|| {
        let primary = normalize_domain(&stage_config.domain);
        certificates
            .iter()
            .find(|cert| cert.is_issued() && cert.covered_domains().contains(&primary))
    })
}

pub fn diff_certificate(current: Option<&Certificate>, stage_config: &StageConfig) -> CertificateDiff {
    let desired: BTreeSet<String> = stage_config.domains().into_iter().collect();
    let covered = current.map(Certificate::covered_domains).unwrap_or_default();

    let domains_added: Vec<String> = desired.difference(&covered).cloned().collect();
    let domains_removed: Vec<String> = covered.difference(&desired).cloned().collect();
    let counts = ChangeCounts {
        changed: 0,
        added: domains_added.len(),
        removed: domains_removed.len(),
    };

    CertificateDiff {
        certificate_arn: current.map(|cert| cert.arn.clone()),
        identical: counts.total() == 0,
        domains_added,
        domains_removed,
        counts,
    }
}

/// Compare only records named after the stage's own domains.
pub fn diff_dns(
    zone: Option<&HostedZone>,
    records: &[DnsRecord],
    distribution: Option<&Distribution>,
    stage_config: &StageConfig,
) -> DnsDiff {
    let target = distribution.map(|d| d.domain_name.as_str());
    let mut changes = Vec::new();

    for domain in stage_config.domains() {
        let routing: Vec<&DnsRecord> = records
            .iter()
            .filter(|r| domains_match(&r.name, &domain))
            .filter(|r| matches!(r.record_type.as_str(), "A" | "AAAA" | "CNAME"))
            .collect();

        if routing.is_empty() {
            changes.push(FieldChange::added(
                domain.clone(),
                target.unwrap_or("distribution"),
            ));
            continue;
        }

        let Some(target) = target else { continue };
        for record in routing {
            if !record.points_to(target) {
                let current = record.targets().collect::<Vec<_>>().join(", ");
                changes.push(FieldChange::changed(
                    format!("{} {}", domain, record.record_type),
                    current,
                    normalize_domain(target),
                ));
            }
        }
    }

    let counts = ChangeCounts::of(&changes);
    DnsDiff {
        zone: zone.map(|z| z.name.clone()),
        identical: changes.is_empty(),
        changes,
        counts,
    }
}

/// Assemble a diff from whatever each fetch returned.
pub fn build_diff(
    stage: Stage,
    stage_config: &StageConfig,
    distributions: Result<Vec<Distribution>, CloudError>,
    certificates: Result<Vec<Certificate>, CloudError>,
    dns: Result<(Option<HostedZone>, Vec<DnsRecord>), CloudError>,
) -> DeploymentDiff {
    let distribution = distributions
        .as_ref()
        .ok()
        .and_then(|list| find_stage_distribution(list, stage_config));

    let cdn = match &distributions {
        Ok(_) => DiffSection::Available(diff_cdn(distribution, stage_config)),
        Err(e) => DiffSection::unavailable(e),
    };

    let certificate = certificates
        .as_ref()
        .ok()
        .and_then(|certs| select_certificate(certs, distribution, stage_config));
    let certificate_status = certificate.map(|c| c.status.clone());
    let certificate_section = match &certificates {
        Ok(_) => DiffSection::Available(diff_certificate(certificate, stage_config)),
        Err(e) => DiffSection::unavailable(e),
    };

    let (hosted_zone, dns_section) = match &dns {
        Ok((zone, records)) => (
            zone.as_ref().map(|z| z.name.clone()),
            DiffSection::Available(diff_dns(zone.as_ref(), records, distribution, stage_config)),
        ),
        Err(e) => (None, DiffSection::unavailable(e)),
    };

    let has_changes = cdn.available().is_some_and(|d| !d.identical)
        || certificate_section.available().is_some_and(|d| !d.identical)
        || dns_section.available().is_some_and(|d| !d.identical);

    DeploymentDiff {
        stage,
        summary: InfraSummary {
            distribution_id: distribution.map(|d| d.id.clone()),
            distribution_domain: distribution.map(|d| d.domain_name.clone()),
            distribution_status: distribution.map(|d| d.status.clone()),
            hosted_zone,
            certificate_status,
        },
        cdn,
        certificate: certificate_section,
        dns: dns_section,
        has_changes,
    }
}

async fn stage_dns_records(
    dns: &dyn DnsOps,
    stage_config: &StageConfig,
) -> Result<(Option<HostedZone>, Vec<DnsRecord>), CloudError> {
    let Some(zone) = find_zone_for(dns, &stage_config.zone_name()).await? else {
        return Ok((None, Vec::new()));
    };
    let records = dns.get_dns_records(&zone.id).await?;
    Ok((Some(zone), records))
}

/// Fetch CDN, certificate and DNS state concurrently and diff them against `stage_config`.
pub async fn compute_diff(
    stage: Stage,
    stage_config: &StageConfig,
    cdn: &dyn DistributionOps,
    certificates: &dyn CertificateOps,
    dns: &dyn DnsOps,
) -> DeploymentDiff {
    let (distributions, certs, records) = tokio::join!(
        cdn.list_distributions(),
        certificates.list_certificates(),
        stage_dns_records(dns, stage_config),
    );
    build_diff(stage, stage_config, distributions, certs, records)
}
