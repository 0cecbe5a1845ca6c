// ABOUTME: Integration tests for distribution classification and audit reports.
// ABOUTME: Checks the deletion guard against DNS references with property tests.

mod support;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use stagecoach::cloud::{Distribution, DnsRecord};
use stagecoach::reconcile::{
    DesiredConfig, DistributionAnalysis, DistributionStatus, NOT_REFERENCED_REASON, Severity,
    analyze, generate_audit_report,
};
use stagecoach::types::DistributionId;
use support::distribution;

const PLACEHOLDER: &str = "placeholder.sst.dev";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
}

fn desired() -> DesiredConfig {
    DesiredConfig::new(
        ["example.com", "www.example.com", "staging.example.com"],
        PLACEHOLDER,
    )
}

fn created(mut dist: Distribution, ago: TimeDelta) -> Distribution {
    dist.created_time = Some(now() - ago);
    dist
}

#[test]
fn abandoned_placeholder_is_deletable_orphan() {
    let dist = created(
        distribution("E3ABANDONED01", PLACEHOLDER, &[]),
        TimeDelta::hours(2),
    );

    let analysis = analyze(&dist, &desired(), &[], now());

    assert_eq!(analysis.status, DistributionStatus::Orphaned);
    assert!(analysis.placeholder_origin);
    assert!(analysis.can_delete());
}

#[test]
fn placeholder_on_configured_domain_is_misconfigured_warning() {
    let dist = created(
        distribution("E3HALFWIRED01", PLACEHOLDER, &["staging.example.com"]),
        TimeDelta::minutes(5),
    );

    let analysis = analyze(&dist, &desired(), &[], now());

    assert_eq!(analysis.status, DistributionStatus::Misconfigured);
    assert_eq!(analysis.severity, Severity::Warning);
    assert!(analysis.can_delete());
}

#[test]
fn dns_reference_without_config_is_never_deletable() {
    let dist = distribution("E3LEGACYSITE1", "legacy.s3.amazonaws.com", &["old.example.org"]);
    let records = vec![DnsRecord::alias(
        "old.example.org.",
        "A",
        format!("{}.", dist.domain_name),
    )];

    let analysis = analyze(&dist, &desired(), &records, now());

    assert_eq!(analysis.status, DistributionStatus::Misconfigured);
    assert_eq!(analysis.severity, Severity::Error);
    assert_eq!(analysis.dns_aliases, vec!["old.example.org".to_string()]);
    assert!(!analysis.can_delete());
}

#[test]
fn configured_distribution_is_info_and_kept() {
    let dist = distribution(
        "E3PRODUCTION1",
        "site-assets.s3.amazonaws.com",
        &["example.com", "www.example.com"],
    );

    let analysis = analyze(&dist, &desired(), &[], now());

    assert_eq!(analysis.status, DistributionStatus::Configured);
    assert_eq!(analysis.severity, Severity::Info);
    assert!(!analysis.can_delete());
}

#[test]
fn unreferenced_distribution_is_deletable() {
    let dist = distribution("E3FORGOTTEN01", "bucket.s3.amazonaws.com", &[]);

    let analysis = analyze(&dist, &desired(), &[], now());

    assert_eq!(analysis.status, DistributionStatus::Orphaned);
    assert!(analysis.reasons.iter().any(|r| r == NOT_REFERENCED_REASON));
    assert!(analysis.can_delete());
}

#[test]
fn analysis_is_repeatable() {
    let dist = created(
        distribution("E3ABANDONED01", PLACEHOLDER, &["preview.example.net"]),
        TimeDelta::days(3),
    );
    let records = vec![DnsRecord::plain(
        "example.com.",
        "A",
        vec!["192.0.2.10".into()],
    )];

    let first = analyze(&dist, &desired(), &records, now());
    let second = analyze(&dist, &desired(), &records, now());

    assert_eq!(first, second);
}

#[test]
fn report_partitions_by_status() {
    let distributions = vec![
        distribution("E3PRODUCTION1", "site.s3.amazonaws.com", &["example.com"]),
        created(distribution("E3ABANDONED01", PLACEHOLDER, &[]), TimeDelta::hours(6)),
        distribution("E3LEGACYSITE1", "legacy.s3.amazonaws.com", &["old.example.org"]),
    ];
    let records = vec![DnsRecord::alias(
        "old.example.org",
        "CNAME",
        "e3legacysite1.cloudfront.net",
    )];

    let report = generate_audit_report(&distributions, &desired(), &records, now());

    assert_eq!(report.configured.len(), 1);
    assert_eq!(report.orphaned.len(), 1);
    assert_eq!(report.misconfigured.len(), 1);
    assert!(!report.is_clean());
    let deletable: Vec<DistributionId> = report.deletable().into_iter().map(|a| a.id).collect();
    assert_eq!(deletable, vec![DistributionId::new("E3ABANDONED01")]);
}

fn status_strategy() -> impl Strategy<Value = DistributionStatus> {
    prop_oneof![
        Just(DistributionStatus::Configured),
        Just(DistributionStatus::Orphaned),
        Just(DistributionStatus::Misconfigured),
    ]
}

proptest! {
    #[test]
    fn dns_referenced_distributions_are_never_deletable(
        status in status_strategy(),
        placeholder in any::<bool>(),
        not_referenced in any::<bool>(),
        aliases in prop::collection::vec("[a-z]{1,8}\\.example\\.com", 1..4),
    ) {
        let analysis = DistributionAnalysis {
            id: DistributionId::new("E3PROPERTY001"),
            domain: "e3property001.cloudfront.net".to_string(),
            origin_domain: "origin.example.net".to_string(),
            aliases: Vec::new(),
            status,
            severity: Severity::Info,
            reasons: if not_referenced {
                vec![NOT_REFERENCED_REASON.to_string()]
            } else {
                Vec::new()
            },
            recommendations: Vec::new(),
            dns_aliases: aliases,
            placeholder_origin: placeholder,
            created_time: None,
            last_modified_time: None,
        };
        prop_assert!(!analysis.can_delete());
    }

    #[test]
    fn distributions_pointed_at_by_dns_are_never_deletable(
        origin in prop_oneof![Just(PLACEHOLDER.to_string()), "[a-z]{3,10}\\.s3\\.amazonaws\\.com"],
        alias in prop_oneof![Just("example.com".to_string()), "[a-z]{3,10}\\.example\\.org"],
        hours in 0i64..200,
    ) {
        let dist = created(distribution("E3PROPERTY002", &origin, &[alias.as_str()]), TimeDelta::hours(hours));
        let records = vec![DnsRecord::alias(alias.clone(), "A", dist.domain_name.clone())];

        let analysis = analyze(&dist, &desired(), &records, now());

        prop_assert!(!analysis.dns_aliases.is_empty());
        prop_assert!(!analysis.can_delete());
    }
}
