// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates a stagecoach.yml template file.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ProjectName;

use super::CONFIG_FILENAME;

pub fn init_config(dir: &Path, project: Option<&str>, domain: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let project = match project {
        Some(p) => ProjectName::new(p).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => ProjectName::new("my-site").map_err(|e| Error::InvalidConfig(e.to_string()))?,
    };
    let domain = domain.unwrap_or("example.com");

    std::fs::write(&config_path, generate_template_yaml(&project, domain))?;

    Ok(())
}

fn generate_template_yaml(project: &ProjectName, domain: &str) -> String {
    format!(
        r#"project: {project}

stages:
  staging:
    domain: staging.{domain}
    health_checks:
      - url: https://staging.{domain}/
  production:
    domain: {domain}
    aliases:
      - www.{domain}
    require_clean_git: true
    health_checks:
      - url: https://{domain}/

build:
  command: ["npm", "run", "build"]

deploy:
  command: ["npx", "sst", "deploy", "--stage", "{{stage}}"]
  # preview_command: ["npx", "sst", "diff", "--stage", "{{stage}}"]
  # distribution_output_key: distributionId

# lock:
#   ttl: 30m

# maintenance:
#   placeholder_url: https://maintenance.{domain}/index.html

# pulumi:
#   backend_dir: ~/.pulumi-state
"#
    )
}
