// ABOUTME: Everything one pipeline run needs, constructed explicitly and passed in.
// ABOUTME: Collaborators are trait objects so tests can substitute them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::DeployError;
use crate::cloud::aws::AwsCli;
use crate::cloud::{CertificateOps, DistributionOps, DnsOps, IdentityOps, MaintenanceOps};
use crate::config::{AwsConfig, Config, StageConfig};
use crate::executor::{
    CommandDeployExecutor, DeployExecutor, HealthProber, HttpHealthProber, PreflightCheck,
    default_checks,
};
use crate::lock::{LockManager, LockStore, PulumiFileBackend};
use crate::types::Stage;

/// Cloud capabilities, one handle per concern.
#[derive(Clone)]
pub struct CloudClients {
    pub cdn: Arc<dyn DistributionOps>,
    pub certificates: Arc<dyn CertificateOps>,
    pub dns: Arc<dyn DnsOps>,
    pub maintenance: Arc<dyn MaintenanceOps>,
    pub identity: Arc<dyn IdentityOps>,
}

impl CloudClients {
    /// All capabilities served by the aws CLI.
    pub fn aws(config: &AwsConfig) -> Self {
        let cli = Arc::new(AwsCli::new(config));
        Self {
            cdn: cli.clone(),
            certificates: cli.clone(),
            dns: cli.clone(),
            maintenance: cli.clone(),
            identity: cli,
        }
    }
}

pub struct DeployContext {
    pub config: Config,
    pub project_root: PathBuf,
    pub locks: LockManager,
    pub executor: Arc<dyn DeployExecutor>,
    pub health: Arc<dyn HealthProber>,
    pub cloud: CloudClients,
    pub preflight: Vec<Box<dyn PreflightCheck>>,
}

impl DeployContext {
    /// Production wiring: local commands, reqwest probes, aws CLI.
    pub fn for_project(config: Config, project_root: &Path) -> Result<Self, DeployError> {
        let cloud = CloudClients::aws(&config.aws);
        let health = HttpHealthProber::from_config(&config)
            .map_err(|e| DeployError::config_error(e.to_string()))?;
        let preflight = default_checks(&config, project_root, cloud.identity.clone());

        Ok(Self {
            locks: lock_manager(&config, project_root),
            executor: Arc::new(CommandDeployExecutor::new(project_root, &config)),
            health: Arc::new(health),
            preflight,
            cloud,
            project_root: project_root.to_path_buf(),
            config,
        })
    }

    pub fn stage_config(&self, stage: Stage) -> Result<&StageConfig, DeployError> {
        self.config
            .stage(stage)
            .map_err(|e| DeployError::config_error(e.to_string()))
    }
}

/// Lock manager for a project, with the Pulumi backend when configured.
pub fn lock_manager(config: &Config, project_root: &Path) -> LockManager {
    let manager = LockManager::new(
        config.project.clone(),
        LockStore::for_project_root(project_root),
        config.lock_ttl(),
    );
    match &config.pulumi {
        Some(pulumi) => manager.with_state_backend(Arc::new(PulumiFileBackend::new(
            pulumi.resolve_backend_dir(project_root),
            config.pulumi_project(),
        ))),
        None => manager,
    }
}
