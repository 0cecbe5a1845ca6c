// ABOUTME: Infrastructure reconciliation: distribution analysis, audit reports, diffs and cleanup.
// ABOUTME: Reads live cloud state and compares it against the desired configuration.

mod analyzer;
mod cleanup;
mod diff;
mod report;

pub use analyzer::{
    DesiredConfig, DistributionAnalysis, DistributionStatus, NOT_REFERENCED_REASON, Severity,
    analyze, orphan_age_threshold,
};
pub use cleanup::{CleanupResult, cleanup_distributions};
pub use diff::{
    CdnDiff, CertificateDiff, ChangeCounts, ChangeKind, DeploymentDiff, DiffSection, DnsDiff,
    FieldChange, InfraSummary, build_diff, compute_diff, diff_cdn, diff_certificate, diff_dns,
    find_stage_distribution, select_certificate,
};
pub use report::{AuditReport, fetch_all_dns_records, generate_audit_report, run_audit};
