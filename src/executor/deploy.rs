// ABOUTME: Build and deploy delegation to the external deployment tool.
// ABOUTME: Runs configured commands and hands back only the typed distribution ID.

use async_trait::async_trait;
use nonempty::NonEmpty;
use std::path::{Path, PathBuf};

use super::command::CommandRunner;
use super::output_parser::extract_distribution_id;
use super::ExecutorError;
use crate::applicable::Applicable;
use crate::config::{CommandConfig, Config, DeployCommandConfig};
use crate::types::{DistributionId, Stage};

/// What the deploy tool reported back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOutput {
    /// Distribution serving the stage, when the tool printed one.
    pub distribution_id: Option<DistributionId>,
}

/// Runs the build and the delegated deploy.
#[async_trait]
pub trait DeployExecutor: Send + Sync {
    /// Run the build step. Skipped when no build command is configured.
    async fn run_build(&self) -> Result<Applicable<()>, ExecutorError>;

    /// Deploy `stage`, or preview it when `dry_run` is set.
    async fn execute_deploy(&self, stage: Stage, dry_run: bool)
    -> Result<DeployOutput, ExecutorError>;
}

/// Executes the commands from the `build` and `deploy` config sections.
#[derive(Debug, Clone)]
pub struct CommandDeployExecutor {
    project_root: PathBuf,
    build: Option<CommandConfig>,
    deploy: DeployCommandConfig,
    env: Vec<(String, String)>,
}

impl CommandDeployExecutor {
    pub fn new(project_root: impl Into<PathBuf>, config: &Config) -> Self {
        let mut env = Vec::new();
        if let Some(profile) = &config.aws.profile {
            env.push(("AWS_PROFILE".to_string(), profile.clone()));
        }
        if let Some(region) = &config.aws.region {
            env.push(("AWS_REGION".to_string(), region.clone()));
        }

        Self {
            project_root: project_root.into(),
            build: config.build.clone(),
            deploy: config.deploy.clone(),
            env,
        }
    }

    fn runner(&self, root: &Path) -> CommandRunner {
        self.env
            .iter()
            .fold(CommandRunner::new().working_dir(root), |runner, (k, v)| {
                runner.env(k, v)
            })
    }
}

/// Substitute `{stage}` in every argument.
fn render(command: &NonEmpty<String>, stage: Stage) -> (String, Vec<String>) {
    let render = |arg: &String| arg.replace("{stage}", stage.as_str());
    (render(&command.head), command.tail.iter().map(render).collect())
}

#[async_trait]
impl DeployExecutor for CommandDeployExecutor {
    async fn run_build(&self) -> Result<Applicable<()>, ExecutorError> {
        let Some(build) = &self.build else {
            return Ok(Applicable::skipped("no build command configured"));
        };

        let output = self
            .runner(&self.project_root)
            .run_with_timeout(&build.command.head, &build.command.tail, build.timeout)
            .await?;
        if !output.success() {
            return Err(ExecutorError::failed("build", &output));
        }
        Ok(Applicable::Applied(()))
    }

    async fn execute_deploy(
        &self,
        stage: Stage,
        dry_run: bool,
    ) -> Result<DeployOutput, ExecutorError> {
        let command = if dry_run {
            match &self.deploy.preview_command {
                Some(preview) => preview,
                None => {
                    tracing::debug!("no preview command configured, skipping delegated preview");
                    return Ok(DeployOutput::default());
                }
            }
        } else {
            &self.deploy.command
        };

        let (program, args) = render(command, stage);
        let output = self
            .runner(&self.project_root)
            .run_with_timeout(&program, &args, self.deploy.timeout)
            .await?;
        if !output.success() {
            let step = if dry_run { "preview" } else { "deploy" };
            return Err(ExecutorError::failed(step, &output));
        }

        let distribution_id =
            extract_distribution_id(&output.stdout, &self.deploy.distribution_output_key);
        if distribution_id.is_none() {
            tracing::debug!(
                "no {} found in deploy output",
                self.deploy.distribution_output_key
            );
        }
        Ok(DeployOutput { distribution_id })
    }
}
