// ABOUTME: Classifies CDN distributions as configured, orphaned or misconfigured.
// ABOUTME: Pure over its inputs; deletion eligibility is derived from the result.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::cloud::{Distribution, DnsRecord};
use crate::config::Config;
use crate::types::{DistributionId, domains_match, normalize_domain};

/// Reason recorded for a distribution nothing points at.
pub const NOT_REFERENCED_REASON: &str = "Not referenced in config or DNS";

/// Age after which a placeholder-origin distribution is considered abandoned.
pub fn orphan_age_threshold() -> TimeDelta {
    TimeDelta::hours(1)
}

/// The desired side of an audit: every configured domain plus the placeholder sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredConfig {
    domains: BTreeSet<String>,
    placeholder_origin: String,
}

impl DesiredConfig {
    pub fn new<I, S>(domains: I, placeholder_origin: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|d| normalize_domain(d.as_ref()))
                .collect(),
            placeholder_origin: normalize_domain(placeholder_origin),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.all_domains(), &config.placeholder_origin)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains(&normalize_domain(domain))
    }

    pub fn domains(&self) -> &BTreeSet<String> {
        &self.domains
    }

    pub fn placeholder_origin(&self) -> &str {
        &self.placeholder_origin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionStatus {
    Configured,
    Orphaned,
    Misconfigured,
}

impl DistributionStatus {
    pub const ALL: [DistributionStatus; 3] = [
        DistributionStatus::Configured,
        DistributionStatus::Orphaned,
        DistributionStatus::Misconfigured,
    ];
}

impl std::fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DistributionStatus::Configured => "configured",
            DistributionStatus::Orphaned => "orphaned",
            DistributionStatus::Misconfigured => "misconfigured",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Warning, Severity::Error];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Classification of a single distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionAnalysis {
    pub id: DistributionId,
    /// Canonical provider hostname.
    pub domain: String,
    pub origin_domain: String,
    pub aliases: Vec<String>,
    pub status: DistributionStatus,
    pub severity: Severity,
    pub reasons: Vec<String>,
    pub recommendations: Vec<String>,
    /// Names of DNS records resolving to this distribution.
    pub dns_aliases: Vec<String>,
    pub placeholder_origin: bool,
    pub created_time: Option<DateTime<Utc>>,
    pub last_modified_time: Option<DateTime<Utc>>,
}

impl DistributionAnalysis {
    /// Whether cleanup may offer this distribution for deletion.
    ///
    /// A distribution any DNS record resolves to is never deletable.
    pub fn can_delete(&self) -> bool {
        if !self.dns_aliases.is_empty() {
            return false;
        }
        match self.status {
            DistributionStatus::Configured => false,
            DistributionStatus::Misconfigured => self.placeholder_origin,
            DistributionStatus::Orphaned => {
                self.placeholder_origin
                    || self
                        .reasons
                        .iter()
                        .any(|r| r.eq_ignore_ascii_case(NOT_REFERENCED_REASON))
            }
        }
    }
}

/// Analyze one distribution against desired config and live DNS.
pub fn analyze(
    distribution: &Distribution,
    desired: &DesiredConfig,
    dns_records: &[DnsRecord],
    now: DateTime<Utc>,
) -> DistributionAnalysis {
    let matched_domains: Vec<&str> = std::iter::once(distribution.domain_name.as_str())
        .chain(distribution.aliases.iter().map(String::as_str))
        .filter(|domain| desired.contains(domain))
        .collect();
    let in_config = !matched_domains.is_empty();

    let mut dns_aliases: Vec<String> = dns_records
        .iter()
        .filter(|record| record.points_to(&distribution.domain_name))
        .map(|record| normalize_domain(&record.name))
        .collect();
    dns_aliases.sort();
    dns_aliases.dedup();
    let in_dns = !dns_aliases.is_empty();

    let placeholder_origin = distribution
        .origins
        .iter()
        .any(|origin| domains_match(origin, desired.placeholder_origin()));

    let age = distribution.observed_since().map(|since| now - since);
    let abandoned = age.is_some_and(|age| age > orphan_age_threshold());

    let mut reasons = Vec::new();
    let mut recommendations = Vec::new();

    let (status, severity) = if in_config {
        reasons.push(format!("Serves configured domain {}", matched_domains.join(", ")));
        if placeholder_origin {
            reasons.push("Origin is still the placeholder from an incomplete deploy".to_string());
            recommendations.push("Redeploy the stage to finish wiring the origin".to_string());
            (DistributionStatus::Misconfigured, Severity::Warning)
        } else {
            (DistributionStatus::Configured, Severity::Info)
        }
    } else if in_dns {
        reasons.push(format!(
            "In DNS ({}) but not in config",
            dns_aliases.join(", ")
        ));
        recommendations.push(
            "Add the domain to the config or remove the DNS records before cleanup".to_string(),
        );
        (DistributionStatus::Misconfigured, Severity::Error)
    } else if placeholder_origin && abandoned {
        reasons.push("Placeholder origin older than one hour".to_string());
        recommendations.push("Delete this distribution left by a failed deploy".to_string());
        (DistributionStatus::Orphaned, Severity::Warning)
    } else {
        if placeholder_origin {
            reasons.push("Placeholder origin from a recent or in-progress deploy".to_string());
        } else {
            reasons.push(NOT_REFERENCED_REASON.to_string());
        }
        recommendations.push("Verify nothing uses this distribution before deleting".to_string());
        (DistributionStatus::Orphaned, Severity::Info)
    };

    DistributionAnalysis {
        id: distribution.id.clone(),
        domain: normalize_domain(&distribution.domain_name),
        origin_domain: distribution.origin_domain().to_string(),
        aliases: distribution.aliases.clone(),
        status,
        severity,
        reasons,
        recommendations,
        dns_aliases,
        placeholder_origin,
        created_time: distribution.created_time,
        last_modified_time: distribution.last_modified_time,
    }
}
