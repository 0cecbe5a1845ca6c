// ABOUTME: Smaller config sections: commands, lock TTL, maintenance, preflight and friends.
// ABOUTME: Every section has defaults so a minimal stagecoach.yml stays short.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An external command: program followed by its arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    pub command: NonEmpty<String>,

    #[serde(default = "default_build_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeployCommandConfig {
    /// Deploy command. `{stage}` in any argument is replaced with the stage name.
    pub command: NonEmpty<String>,

    /// Command run instead of `command` in dry-run mode.
    #[serde(default)]
    pub preview_command: Option<NonEmpty<String>>,

    /// Output key whose value is the CDN distribution ID.
    #[serde(default = "default_distribution_output_key")]
    pub distribution_output_key: String,

    #[serde(default = "default_deploy_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_lock_ttl", with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: default_lock_ttl(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    /// URL of the static placeholder page served during the window.
    pub placeholder_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreflightConfig {
    #[serde(default = "default_true")]
    pub check_credentials: bool,

    #[serde(default)]
    pub require_clean_git: bool,

    #[serde(default)]
    pub test_command: Option<NonEmpty<String>>,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            check_credentials: true,
            require_clean_git: false,
            test_command: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvalidationConfig {
    #[serde(default = "default_invalidation_paths")]
    pub paths: NonEmpty<String>,
}

impl Default for InvalidationConfig {
    fn default() -> Self {
        Self {
            paths: default_invalidation_paths(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PulumiConfig {
    /// Root of a self-managed Pulumi backend (the directory holding `.pulumi/`).
    pub backend_dir: PathBuf,

    /// Pulumi project name when it differs from `project`.
    #[serde(default)]
    pub project: Option<String>,
}

impl PulumiConfig {
    /// Absolute backend location. A leading `~` is the user's home directory;
    /// other relative paths are taken from `project_root`.
    pub fn resolve_backend_dir(&self, project_root: &Path) -> PathBuf {
        expand_backend_dir(&self.backend_dir, project_root, dirs::home_dir().as_deref())
    }
}

fn expand_backend_dir(path: &Path, project_root: &Path, home: Option<&Path>) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        match home {
            Some(home) => return home.join(rest),
            None => tracing::warn!("cannot expand {}: no home directory", path.display()),
        }
    }
    project_root.join(path)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsConfig {
    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZonesConfig {
    /// Minimum age before an empty tracked zone is reported as stale.
    #[serde(default = "default_stale_after", with = "humantime_serde")]
    pub stale_after: Duration,
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            stale_after: default_stale_after(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_build_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_deploy_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_lock_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_stale_after() -> Duration {
    Duration::from_secs(7 * 24 * 60 * 60)
}

fn default_distribution_output_key() -> String {
    "distributionId".to_string()
}

fn default_invalidation_paths() -> NonEmpty<String> {
    NonEmpty::new("/*".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilde_backend_dir_is_under_home() {
        assert_eq!(
            expand_backend_dir(
                Path::new("~/.pulumi-state"),
                Path::new("/srv/site"),
                Some(Path::new("/home/deployer")),
            ),
            PathBuf::from("/home/deployer/.pulumi-state")
        );
    }

    #[test]
    fn relative_backend_dir_is_under_project_root() {
        assert_eq!(
            expand_backend_dir(Path::new("state"), Path::new("/srv/site"), None),
            PathBuf::from("/srv/site/state")
        );
        assert_eq!(
            expand_backend_dir(
                Path::new("~other/state"),
                Path::new("/srv/site"),
                Some(Path::new("/home/deployer")),
            ),
            PathBuf::from("/srv/site/~other/state")
        );
    }

    #[test]
    fn absolute_backend_dir_is_kept() {
        assert_eq!(
            expand_backend_dir(Path::new("/var/pulumi"), Path::new("/srv/site"), None),
            PathBuf::from("/var/pulumi")
        );
    }
}
