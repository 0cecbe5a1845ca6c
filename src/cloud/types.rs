// ABOUTME: Typed snapshots of live CDN, DNS and certificate state.
// ABOUTME: These are the inputs to diffing and distribution analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{CertificateArn, DistributionId, ZoneId, domains_match, normalize_domain};

/// A CDN distribution as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub id: DistributionId,
    /// Canonical provider hostname, e.g. `d111abc.cloudfront.net`.
    pub domain_name: String,
    /// Alternate domain names (CNAMEs) attached to the distribution.
    pub aliases: Vec<String>,
    /// Origin hostnames, in provider order.
    pub origins: Vec<String>,
    pub enabled: bool,
    pub status: String,
    pub price_class: Option<String>,
    pub certificate_arn: Option<CertificateArn>,
    pub created_time: Option<DateTime<Utc>>,
    pub last_modified_time: Option<DateTime<Utc>>,
}

impl Distribution {
    /// Primary origin hostname, empty when none is configured.
    pub fn origin_domain(&self) -> &str {
        self.origins.first().map(String::as_str).unwrap_or("")
    }

    /// Whether `domain` is one of the distribution's aliases.
    pub fn serves(&self, domain: &str) -> bool {
        self.aliases.iter().any(|alias| domains_match(alias, domain))
    }

    /// Creation time when known, otherwise last modification.
    pub fn observed_since(&self) -> Option<DateTime<Utc>> {
        self.created_time.or(self.last_modified_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    pub id: ZoneId,
    /// Zone apex, normalized without the trailing dot.
    pub name: String,
    pub record_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub name: String,
    pub record_type: String,
    /// Alias target hostname (Route 53 alias records).
    pub alias_target: Option<String>,
    /// Plain record values.
    pub values: Vec<String>,
}

impl DnsRecord {
    pub fn alias(name: impl Into<String>, record_type: &str, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.to_string(),
            alias_target: Some(target.into()),
            values: Vec::new(),
        }
    }

    pub fn plain(name: impl Into<String>, record_type: &str, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.to_string(),
            alias_target: None,
            values,
        }
    }

    /// Every hostname this record resolves to.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.alias_target
            .iter()
            .map(String::as_str)
            .chain(self.values.iter().map(String::as_str))
    }

    /// Whether the record resolves to `domain`, ignoring case and trailing dots.
    pub fn points_to(&self, domain: &str) -> bool {
        self.targets().any(|target| domains_match(target, domain))
    }

    /// Zone bookkeeping records present in every hosted zone.
    pub fn is_zone_apex_record(&self) -> bool {
        matches!(self.record_type.as_str(), "NS" | "SOA")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub arn: CertificateArn,
    pub domain_name: String,
    pub subject_alternative_names: Vec<String>,
    pub status: String,
}

impl Certificate {
    pub fn is_issued(&self) -> bool {
        self.status.eq_ignore_ascii_case("ISSUED")
    }

    /// Normalized set of every name the certificate covers.
    pub fn covered_domains(&self) -> BTreeSet<String> {
        std::iter::once(&self.domain_name)
            .chain(self.subject_alternative_names.iter())
            .map(|d| normalize_domain(d))
            .collect()
    }
}

/// Routing snapshot taken before a maintenance window, restored afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorConfig {
    pub distribution_id: DistributionId,
    pub snapshot: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_points_to_alias_or_value() {
        let alias = DnsRecord::alias("example.com.", "A", "D111.cloudfront.net.");
        assert!(alias.points_to("d111.cloudfront.net"));

        let cname = DnsRecord::plain("www.example.com.", "CNAME", vec!["d111.cloudfront.net".into()]);
        assert!(cname.points_to("d111.cloudfront.net."));
        assert!(!cname.points_to("d222.cloudfront.net"));
    }

    #[test]
    fn certificate_covers_primary_and_sans() {
        let cert = Certificate {
            arn: CertificateArn::new("arn:aws:acm:us-east-1:1:certificate/x"),
            domain_name: "Example.com".into(),
            subject_alternative_names: vec!["example.com".into(), "www.example.com.".into()],
            status: "ISSUED".into(),
        };
        let covered: Vec<_> = cert.covered_domains().into_iter().collect();
        assert_eq!(covered, vec!["example.com", "www.example.com"]);
        assert!(cert.is_issued());
    }
}
