// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Carries the held lock, maintenance snapshot and result builder between phases.

use std::marker::PhantomData;

use crate::cloud::PriorConfig;
use crate::diagnostics::Diagnostics;
use crate::lock::DeploymentLock;
use crate::types::{DistributionId, Stage};

use super::result::PipelineResultBuilder;
use super::state::Initialized;

/// Flags chosen on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Preview only: no lock, no maintenance, no invalidation, health simulated.
    pub dry_run: bool,
    /// Serve the placeholder while the delegated deploy runs.
    pub maintenance: bool,
    /// Print the infrastructure diff before mutating anything.
    pub show_diff: bool,
}

/// A deployment in progress, parameterized by its current state.
///
/// Resources that must be undone on failure (the stage lock and the
/// maintenance snapshot) travel with the deployment so `fail()` can find them
/// from any state.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) stage: Stage,
    pub(crate) options: DeployOptions,
    pub(crate) lock: Option<DeploymentLock>,
    pub(crate) maintenance: Option<PriorConfig>,
    pub(crate) distribution_id: Option<DistributionId>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) result: PipelineResultBuilder,
    pub(crate) state: PhantomData<S>,
}

impl Deployment<Initialized> {
    pub fn new(stage: Stage, options: DeployOptions) -> Self {
        Deployment {
            stage,
            options,
            lock: None,
            maintenance: None,
            distribution_id: None,
            diagnostics: Diagnostics::default(),
            result: PipelineResultBuilder::new(stage, options.dry_run),
            state: PhantomData,
        }
    }
}

impl<S> Deployment<S> {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn options(&self) -> DeployOptions {
        self.options
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// The stage lock, while held.
    pub fn lock(&self) -> Option<&DeploymentLock> {
        self.lock.as_ref()
    }

    /// Whether traffic is currently pointed at the placeholder.
    pub fn maintenance_active(&self) -> bool {
        self.maintenance.is_some()
    }

    pub fn distribution_id(&self) -> Option<&DistributionId> {
        self.distribution_id.as_ref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
