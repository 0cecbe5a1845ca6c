// ABOUTME: Structured outcome of one pipeline run, built up phase by phase.
// ABOUTME: The builder is consumed by finish, so a result is finalized exactly once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

use super::error::{DeployError, DeployErrorKind};
use crate::diagnostics::{Diagnostics, Warning};
use crate::reconcile::{AuditReport, DeploymentDiff};
use crate::types::{DistributionId, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Preflight,
    Diff,
    Lock,
    Build,
    MaintenanceOn,
    Deploy,
    Health,
    MaintenanceOff,
    Release,
    Invalidation,
    Audit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    pub duration_seconds: f64,
    pub completed: bool,
}

/// Which phases finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseFlags {
    pub preflight: bool,
    pub locked: bool,
    pub built: bool,
    pub maintenance_enabled: bool,
    pub deployed: bool,
    pub health_validated: bool,
    pub maintenance_restored: bool,
    pub released: bool,
    pub invalidated: bool,
    pub audited: bool,
}

impl PhaseFlags {
    fn set(&mut self, phase: Phase) {
        match phase {
            Phase::Preflight => self.preflight = true,
            Phase::Diff => {}
            Phase::Lock => self.locked = true,
            Phase::Build => self.built = true,
            Phase::MaintenanceOn => self.maintenance_enabled = true,
            Phase::Deploy => self.deployed = true,
            Phase::Health => self.health_validated = true,
            Phase::MaintenanceOff => self.maintenance_restored = true,
            Phase::Release => self.released = true,
            Phase::Invalidation => self.invalidated = true,
            Phase::Audit => self.audited = true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditCounts {
    pub configured: usize,
    pub orphaned: usize,
    pub misconfigured: usize,
}

impl From<&AuditReport> for AuditCounts {
    fn from(report: &AuditReport) -> Self {
        Self {
            configured: report.configured.len(),
            orphaned: report.orphaned.len(),
            misconfigured: report.misconfigured.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineError {
    pub kind: DeployErrorKind,
    pub message: String,
    pub recovery: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub stage: Stage,
    pub success: bool,
    pub dry_run: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub phases: Vec<PhaseTiming>,
    pub completed: PhaseFlags,
    pub distribution_id: Option<DistributionId>,
    /// Health check URLs listed instead of probed in dry run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub simulated_health_checks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<DeploymentDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditCounts>,
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PipelineError>,
}

/// Accumulates timings and flags while the pipeline runs.
#[derive(Debug)]
pub struct PipelineResultBuilder {
    stage: Stage,
    dry_run: bool,
    start_time: DateTime<Utc>,
    started: Instant,
    phases: Vec<PhaseTiming>,
    completed: PhaseFlags,
    distribution_id: Option<DistributionId>,
    simulated_health_checks: Vec<String>,
    diff: Option<DeploymentDiff>,
    audit: Option<AuditCounts>,
}

impl PipelineResultBuilder {
    pub fn new(stage: Stage, dry_run: bool) -> Self {
        Self {
            stage,
            dry_run,
            start_time: Utc::now(),
            started: Instant::now(),
            phases: Vec::new(),
            completed: PhaseFlags::default(),
            distribution_id: None,
            simulated_health_checks: Vec::new(),
            diff: None,
            audit: None,
        }
    }

    /// Record a phase that ran from `started` until now.
    pub fn record(&mut self, phase: Phase, started: Instant, completed: bool) {
        self.phases.push(PhaseTiming {
            phase,
            duration_seconds: started.elapsed().as_secs_f64(),
            completed,
        });
        if completed {
            self.completed.set(phase);
        }
    }

    pub fn completed(&self) -> PhaseFlags {
        self.completed
    }

    pub fn set_distribution_id(&mut self, id: DistributionId) {
        self.distribution_id = Some(id);
    }

    pub fn set_simulated_health_checks(&mut self, urls: Vec<String>) {
        self.simulated_health_checks = urls;
    }

    pub fn set_diff(&mut self, diff: DeploymentDiff) {
        self.diff = Some(diff);
    }

    pub fn set_audit(&mut self, counts: AuditCounts) {
        self.audit = Some(counts);
    }

    /// Finalize. Consumes the builder.
    pub fn finish(self, diagnostics: &Diagnostics, error: Option<&DeployError>) -> PipelineResult {
        let end_time = Utc::now();
        PipelineResult {
            stage: self.stage,
            success: error.is_none(),
            dry_run: self.dry_run,
            start_time: self.start_time,
            end_time,
            duration_seconds: self.started.elapsed().as_secs_f64(),
            phases: self.phases,
            completed: self.completed,
            distribution_id: self.distribution_id,
            simulated_health_checks: self.simulated_health_checks,
            diff: self.diff,
            audit: self.audit,
            warnings: diagnostics.warnings().to_vec(),
            error: error.map(|e| PipelineError {
                kind: e.kind(),
                message: e.to_string(),
                recovery: e.recovery_hint(self.stage),
            }),
        }
    }
}
