// ABOUTME: Configuration types and parsing for stagecoach.yml.
// ABOUTME: Handles YAML discovery, defaults, and the desired domain set used by reconciliation.

mod health;
mod init;
mod sections;
mod stage;

pub use health::{HealthCheckConfig, HealthConfig};
pub use init::init_config;
pub use sections::{
    AwsConfig, CommandConfig, DeployCommandConfig, InvalidationConfig, LockConfig,
    MaintenanceConfig, PreflightConfig, PulumiConfig, ZonesConfig,
};
pub use stage::StageConfig;

use crate::error::{Error, Result};
use crate::types::{ProjectName, Stage};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "stagecoach.yml";
pub const CONFIG_FILENAME_ALT: &str = "stagecoach.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stagecoach/config.yml";

/// Directory under the project root holding lock files and the zone tracker.
pub const STATE_DIR: &str = ".stagecoach";

/// Origin that SST/Pulumi leave on a distribution whose domain wiring never completed.
pub const DEFAULT_PLACEHOLDER_ORIGIN: &str = "placeholder.sst.dev";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub project: ProjectName,

    pub stages: BTreeMap<Stage, StageConfig>,

    #[serde(default)]
    pub build: Option<CommandConfig>,

    pub deploy: DeployCommandConfig,

    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub maintenance: Option<MaintenanceConfig>,

    #[serde(default = "default_placeholder_origin")]
    pub placeholder_origin: String,

    #[serde(default)]
    pub preflight: PreflightConfig,

    #[serde(default)]
    pub invalidation: InvalidationConfig,

    #[serde(default)]
    pub pulumi: Option<PulumiConfig>,

    #[serde(default)]
    pub aws: AwsConfig,

    #[serde(default)]
    pub zones: ZonesConfig,
}

fn default_placeholder_origin() -> String {
    DEFAULT_PLACEHOLDER_ORIGIN.to_string()
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading config from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one stage must be configured".to_string(),
            ));
        }

        for (stage, stage_config) in &self.stages {
            if stage_config.domain.trim().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "stage {stage} has an empty domain"
                )));
            }
        }

        if let Some(maintenance) = &self.maintenance
            && !maintenance.placeholder_url.starts_with("http")
        {
            return Err(Error::InvalidConfig(format!(
                "maintenance.placeholder_url must be an http(s) URL, got {}",
                maintenance.placeholder_url
            )));
        }

        Ok(())
    }

    /// Configuration for a single stage.
    pub fn stage(&self, stage: Stage) -> Result<&StageConfig> {
        self.stages.get(&stage).ok_or(Error::UnknownStage(stage))
    }

    /// Every domain and alias across all stages, normalized.
    pub fn all_domains(&self) -> BTreeSet<String> {
        self.stages
            .values()
            .flat_map(|stage| stage.domains())
            .collect()
    }

    /// Lock TTL as a chrono duration for timestamp arithmetic.
    pub fn lock_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.lock.ttl).unwrap_or_else(|_| chrono::Duration::minutes(30))
    }

    /// Whether the working tree must be clean before deploying to `stage`.
    pub fn requires_clean_git(&self, stage: Stage) -> bool {
        self.stages
            .get(&stage)
            .and_then(|s| s.require_clean_git)
            .unwrap_or(self.preflight.require_clean_git)
    }

    /// Name of the Pulumi project backing this deployment.
    pub fn pulumi_project(&self) -> String {
        self.pulumi
            .as_ref()
            .and_then(|p| p.project.clone())
            .unwrap_or_else(|| self.project.to_string())
    }

    /// Path of the state directory for a project rooted at `root`.
    pub fn state_dir(root: &Path) -> PathBuf {
        root.join(STATE_DIR)
    }
}
