// ABOUTME: State transition methods for the deployment pipeline.
// ABOUTME: Each method consumes self and returns the next state on success.

use chrono::Utc;
use futures::future::join_all;
use std::marker::PhantomData;
use std::time::Instant;

use crate::applicable::Applicable;
use crate::cloud::distributions_serving;
use crate::diagnostics::Warning;
use crate::lock::{DeploymentLock, ReleaseOutcome};
use crate::reconcile::{DeploymentDiff, DesiredConfig, compute_diff, find_stage_distribution, run_audit};
use crate::types::DistributionId;

use super::Deployment;
use super::context::DeployContext;
use super::error::DeployError;
use super::result::{AuditCounts, Phase, PipelineResult};
use super::state::{
    Built, Completed, Deployed, HealthValidated, Initialized, Invalidated, Locked, PreChecked,
    Released,
};

/// Result type for transitions that may need cleanup on failure.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

/// A failed run: the cause plus the finalized result.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct PipelineFailure {
    pub error: DeployError,
    pub result: PipelineResult,
}

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Deployment<S> {
    /// Internal helper to transition to a new state.
    fn transition<T>(self) -> Deployment<T> {
        Deployment {
            stage: self.stage,
            options: self.options,
            lock: self.lock,
            maintenance: self.maintenance,
            distribution_id: self.distribution_id,
            diagnostics: self.diagnostics,
            result: self.result,
            state: PhantomData,
        }
    }

    fn remember_distribution(&mut self, id: DistributionId) {
        self.result.set_distribution_id(id.clone());
        self.distribution_id = Some(id);
    }

    /// Release a held lock. Failures become warnings.
    fn release_held_lock(&mut self, ctx: &DeployContext, lock: DeploymentLock) {
        let started = Instant::now();
        match ctx.locks.release_lock(&lock) {
            Ok(ReleaseOutcome::Released | ReleaseOutcome::AlreadyReleased) => {
                self.result.record(Phase::Release, started, true);
            }
            Ok(ReleaseOutcome::Superseded { holder_id }) => {
                self.diagnostics.warn(Warning::lock_release(format!(
                    "{} lock is now held by {holder_id}, left in place",
                    self.stage
                )));
                self.result.record(Phase::Release, started, true);
            }
            Err(e) => {
                self.diagnostics.warn(Warning::lock_release(format!(
                    "failed to release {} lock: {e} (run `stagecoach recover {}`)",
                    self.stage, self.stage
                )));
                self.result.record(Phase::Release, started, false);
            }
        }
    }

    /// Undo what this run holds and surface `error`.
    ///
    /// Restores maintenance routing and releases the lock, best effort.
    /// Cleanup problems are recorded as warnings and never replace `error`.
    pub async fn fail(mut self, ctx: &DeployContext, error: DeployError) -> PipelineFailure {
        tracing::debug!("{} deployment failed: {error}", self.stage);

        if let Some(prior) = self.maintenance.take() {
            let started = Instant::now();
            let restored = ctx.cloud.maintenance.disable(&prior).await;
            match restored {
                Ok(()) => self.result.record(Phase::MaintenanceOff, started, true),
                Err(e) => {
                    self.diagnostics.warn(Warning::maintenance_restore(format!(
                        "could not restore routing for {}: {e}; traffic may still be on the placeholder",
                        prior.distribution_id
                    )));
                    self.result.record(Phase::MaintenanceOff, started, false);
                }
            }
        }

        if let Some(lock) = self.lock.take() {
            self.release_held_lock(ctx, lock);
        }

        let result = self.result.finish(&self.diagnostics, Some(&error));
        PipelineFailure { error, result }
    }
}

// =============================================================================
// Initialized -> PreChecked
// =============================================================================

impl Deployment<Initialized> {
    /// Validate options and run every preflight check. Nothing is mutated.
    pub async fn run_preflight(mut self, ctx: &DeployContext) -> TransitionResult<PreChecked, Initialized> {
        let started = Instant::now();

        if let Err(e) = ctx.stage_config(self.stage) {
            return Err((self, e));
        }
        if self.options.maintenance && ctx.config.maintenance.is_none() {
            return Err((
                self,
                DeployError::config_error("--maintenance requires a `maintenance` config section"),
            ));
        }

        for check in &ctx.preflight {
            match check.run(self.stage).await {
                Ok(Applicable::Applied(())) => tracing::debug!("preflight {} passed", check.name()),
                Ok(Applicable::Skipped(reason)) => {
                    tracing::debug!("preflight {} skipped: {reason}", check.name())
                }
                Err(e) => {
                    self.result.record(Phase::Preflight, started, false);
                    return Err((self, e.into()));
                }
            }
        }

        self.result.record(Phase::Preflight, started, true);
        Ok(self.transition::<PreChecked>())
    }
}

// =============================================================================
// PreChecked -> Locked
// =============================================================================

impl Deployment<PreChecked> {
    /// Diff live infrastructure against the stage config. Read-only.
    pub async fn preview_diff(&mut self, ctx: &DeployContext) -> Result<DeploymentDiff, DeployError> {
        let started = Instant::now();
        let stage_config = ctx.stage_config(self.stage)?;
        let diff = compute_diff(
            self.stage,
            stage_config,
            ctx.cloud.cdn.as_ref(),
            ctx.cloud.certificates.as_ref(),
            ctx.cloud.dns.as_ref(),
        )
        .await;
        self.result.set_diff(diff.clone());
        self.result.record(Phase::Diff, started, true);
        Ok(diff)
    }

    /// Claim the stage. Skipped in dry run.
    pub async fn acquire_lock(mut self, ctx: &DeployContext) -> TransitionResult<Locked, PreChecked> {
        if self.options.dry_run {
            tracing::debug!("dry run: not locking {}", self.stage);
            return Ok(self.transition::<Locked>());
        }

        let started = Instant::now();
        match ctx.locks.acquire_lock(self.stage) {
            Ok(lock) => {
                self.lock = Some(lock);
                self.result.record(Phase::Lock, started, true);
                Ok(self.transition::<Locked>())
            }
            Err(e) => {
                self.result.record(Phase::Lock, started, false);
                Err((self, e.into()))
            }
        }
    }
}

// =============================================================================
// Locked -> Built
// =============================================================================

impl Deployment<Locked> {
    pub async fn build(mut self, ctx: &DeployContext) -> TransitionResult<Built, Locked> {
        let started = Instant::now();
        let built = ctx.executor.run_build().await;
        match built {
            Ok(outcome) => {
                if let Some(reason) = outcome.skip_reason() {
                    tracing::debug!("build skipped: {reason}");
                }
                self.result.record(Phase::Build, started, true);
                Ok(self.transition::<Built>())
            }
            Err(e) => {
                self.result.record(Phase::Build, started, false);
                Err((self, DeployError::BuildFailed(e)))
            }
        }
    }
}

// =============================================================================
// Built -> Deployed
// =============================================================================

impl Deployment<Built> {
    /// Point the stage's distribution at the placeholder.
    async fn enable_maintenance(&mut self, ctx: &DeployContext) -> Result<(), DeployError> {
        let Some(settings) = &ctx.config.maintenance else {
            return Err(DeployError::config_error(
                "--maintenance requires a `maintenance` config section",
            ));
        };
        let stage_config = ctx.stage_config(self.stage)?;
        let started = Instant::now();

        let listed = ctx.cloud.cdn.list_distributions().await;
        let distributions = listed.map_err(|e| {
            self.result.record(Phase::MaintenanceOn, started, false);
            DeployError::MaintenanceFailed(format!("could not list distributions: {e}"))
        })?;

        let Some(distribution) = find_stage_distribution(&distributions, stage_config) else {
            self.diagnostics.warn(Warning::maintenance_skipped(format!(
                "no distribution serves {} yet, deploying without a maintenance window",
                stage_config.domain
            )));
            return Ok(());
        };
        let id = distribution.id.clone();
        self.remember_distribution(id.clone());

        let enabled = ctx
            .cloud
            .maintenance
            .enable(&id, &settings.placeholder_url)
            .await;
        match enabled {
            Ok(prior) => {
                self.maintenance = Some(prior);
                self.result.record(Phase::MaintenanceOn, started, true);
                Ok(())
            }
            Err(e) => {
                self.result.record(Phase::MaintenanceOn, started, false);
                Err(DeployError::MaintenanceFailed(e.to_string()))
            }
        }
    }

    /// Run the delegated deploy (or preview in dry run).
    pub async fn deploy(mut self, ctx: &DeployContext) -> TransitionResult<Deployed, Built> {
        if self.options.maintenance
            && !self.options.dry_run
            && let Err(e) = self.enable_maintenance(ctx).await
        {
            return Err((self, e));
        }

        let started = Instant::now();
        let deployed = ctx
            .executor
            .execute_deploy(self.stage, self.options.dry_run)
            .await;
        match deployed {
            Ok(output) => {
                if let Some(id) = output.distribution_id {
                    self.remember_distribution(id);
                }
                self.result.record(Phase::Deploy, started, true);
                Ok(self.transition::<Deployed>())
            }
            Err(e) => {
                self.result.record(Phase::Deploy, started, false);
                Err((self, DeployError::DeployFailed(e)))
            }
        }
    }
}

// =============================================================================
// Deployed -> HealthValidated
// =============================================================================

impl Deployment<Deployed> {
    /// Probe the stage. In dry run, list the checks instead.
    pub async fn validate_health(
        mut self,
        ctx: &DeployContext,
    ) -> TransitionResult<HealthValidated, Deployed> {
        if self.options.dry_run {
            let urls: Vec<String> = match ctx.stage_config(self.stage) {
                Ok(stage_config) => stage_config
                    .health_checks
                    .iter()
                    .map(|check| check.url.clone())
                    .collect(),
                Err(e) => return Err((self, e)),
            };
            self.result.set_simulated_health_checks(urls);
            return Ok(self.transition::<HealthValidated>());
        }

        let started = Instant::now();
        let checked = ctx.health.run_checks(self.stage).await;
        match checked {
            Ok(true) => {
                self.result.record(Phase::Health, started, true);
                Ok(self.transition::<HealthValidated>())
            }
            Ok(false) => {
                self.result.record(Phase::Health, started, false);
                let message = format!("{} is not healthy after deploy", self.stage);
                Err((self, DeployError::HealthCheckFailed(message)))
            }
            Err(e) => {
                self.result.record(Phase::Health, started, false);
                Err((self, DeployError::HealthCheckFailed(e.to_string())))
            }
        }
    }
}

// =============================================================================
// HealthValidated -> Released
// =============================================================================

impl Deployment<HealthValidated> {
    /// Restore routing and release the lock.
    pub async fn release(mut self, ctx: &DeployContext) -> TransitionResult<Released, HealthValidated> {
        if let Some(prior) = self.maintenance.take() {
            let started = Instant::now();
            let restored = ctx.cloud.maintenance.disable(&prior).await;
            if let Err(e) = restored {
                self.maintenance = Some(prior);
                self.result.record(Phase::MaintenanceOff, started, false);
                return Err((
                    self,
                    DeployError::MaintenanceFailed(format!("could not restore routing: {e}")),
                ));
            }
            self.result.record(Phase::MaintenanceOff, started, true);
        }

        if let Some(lock) = self.lock.take() {
            self.release_held_lock(ctx, lock);
        }
        Ok(self.transition::<Released>())
    }
}

// =============================================================================
// Released -> Invalidated -> Completed
// =============================================================================

impl Deployment<Released> {
    /// Invalidate every distribution serving the stage. Failures are warnings.
    pub async fn invalidate_cache(mut self, ctx: &DeployContext) -> Deployment<Invalidated> {
        if self.options.dry_run {
            tracing::debug!("dry run: skipping cache invalidation");
            return self.transition::<Invalidated>();
        }

        let started = Instant::now();
        let mut targets: Vec<DistributionId> = self.distribution_id.iter().cloned().collect();
        if let Ok(stage_config) = ctx.stage_config(self.stage) {
            let domains = stage_config.domains();
            match ctx.cloud.cdn.list_distributions().await {
                Ok(distributions) => {
                    for dist in distributions_serving(&distributions, &domains) {
                        if !targets.contains(&dist.id) {
                            targets.push(dist.id.clone());
                        }
                    }
                }
                Err(e) => tracing::debug!("could not list distributions for invalidation: {e}"),
            }
        }

        if targets.is_empty() {
            self.diagnostics.warn(Warning::cache_invalidation(format!(
                "no distribution found for {}, cache not invalidated",
                self.stage
            )));
            self.result.record(Phase::Invalidation, started, false);
            return self.transition::<Invalidated>();
        }
        if self.distribution_id.is_none() {
            self.remember_distribution(targets[0].clone());
        }

        let paths: Vec<String> = ctx.config.invalidation.paths.iter().cloned().collect();
        let results = join_all(
            targets
                .iter()
                .map(|id| ctx.cloud.cdn.create_invalidation(id, &paths)),
        )
        .await;

        let mut all_ok = true;
        for (id, result) in targets.iter().zip(results) {
            match result {
                Ok(invalidation) => tracing::debug!("invalidation {invalidation} created for {id}"),
                Err(e) => {
                    all_ok = false;
                    self.diagnostics.warn(Warning::cache_invalidation(format!(
                        "failed to invalidate {id}: {e}"
                    )));
                }
            }
        }
        self.result.record(Phase::Invalidation, started, all_ok);
        self.transition::<Invalidated>()
    }
}

impl Deployment<Invalidated> {
    /// Classify every distribution in the account. Findings are warnings.
    pub async fn audit(mut self, ctx: &DeployContext) -> Deployment<Completed> {
        let started = Instant::now();
        let desired = DesiredConfig::from_config(&ctx.config);
        let audited = run_audit(
            ctx.cloud.cdn.as_ref(),
            ctx.cloud.dns.as_ref(),
            &desired,
            Utc::now(),
        )
        .await;

        match audited {
            Ok(report) => {
                for issue in &report.issues {
                    self.diagnostics.warn(Warning::reconciliation(issue.clone()));
                }
                self.result.set_audit(AuditCounts::from(&report));
                self.result.record(Phase::Audit, started, true);
            }
            Err(e) => {
                self.diagnostics
                    .warn(Warning::audit(format!("post-deploy audit failed: {e}")));
                self.result.record(Phase::Audit, started, false);
            }
        }
        self.transition::<Completed>()
    }
}

impl Deployment<Completed> {
    /// Finalize the run.
    pub fn finish(self) -> PipelineResult {
        self.result.finish(&self.diagnostics, None)
    }
}
