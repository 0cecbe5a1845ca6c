// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the pipeline driver and recovery.

mod context;
mod deployment;
mod error;
mod pipeline;
mod recovery;
mod result;
mod state;
mod transitions;

pub use context::{CloudClients, DeployContext, lock_manager};
pub use deployment::{DeployOptions, Deployment};
pub use error::{DeployError, DeployErrorKind};
pub use pipeline::run;
pub use recovery::{LockRecovery, RecoveryReport, recover};
pub use result::{
    AuditCounts, Phase, PhaseFlags, PhaseTiming, PipelineError, PipelineResult,
    PipelineResultBuilder,
};
pub use state::{
    Built, Completed, Deployed, HealthValidated, Initialized, Invalidated, Locked, PreChecked,
    Released,
};
pub use transitions::{PipelineFailure, TransitionResult};
