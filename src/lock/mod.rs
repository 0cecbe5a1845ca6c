// ABOUTME: Deployment locks preventing concurrent deployments to the same stage.
// ABOUTME: File-backed per-stage records plus the delegated tool's state lock.

mod error;
mod info;
mod manager;
mod pulumi;
mod store;

pub use error::LockError;
pub use info::DeploymentLock;
pub use manager::{LockManager, LockStatus, PulumiLockCheck, ReleaseOutcome};
pub use pulumi::{PulumiFileBackend, StateLockBackend};
pub use store::LockStore;
