// ABOUTME: Cloud adapter backed by the `aws` command line client.
// ABOUTME: Shells out with JSON output and maps responses into typed snapshots.

mod acm;
mod cloudfront;
mod maintenance;
mod route53;

use serde::de::DeserializeOwned;
use snafu::ResultExt;
use std::time::Duration;

use super::error::{CommandSnafu, ParseSnafu};
use super::CloudError;
use crate::config::AwsConfig;
use crate::executor::CommandRunner;

/// Region where CloudFront certificates must live.
const CERTIFICATE_REGION: &str = "us-east-1";

const CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Talks to AWS through the installed `aws` CLI.
#[derive(Debug, Clone)]
pub struct AwsCli {
    runner: CommandRunner,
    profile: Option<String>,
    region: Option<String>,
}

impl AwsCli {
    pub fn new(config: &AwsConfig) -> Self {
        Self {
            runner: CommandRunner::new().timeout(CALL_TIMEOUT),
            profile: config.profile.clone(),
            region: config.region.clone(),
        }
    }

    fn args(&self, service_args: &[&str], region: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = service_args.iter().map(|s| s.to_string()).collect();
        args.extend(["--output".to_string(), "json".to_string()]);
        if let Some(profile) = &self.profile {
            args.extend(["--profile".to_string(), profile.clone()]);
        }
        if let Some(region) = region.or(self.region.as_deref()) {
            args.extend(["--region".to_string(), region.to_string()]);
        }
        args
    }

    /// Run an aws subcommand and return raw stdout.
    async fn call(
        &self,
        operation: &str,
        service_args: &[&str],
        region: Option<&str>,
    ) -> Result<String, CloudError> {
        self.call_within(operation, service_args, region, CALL_TIMEOUT)
            .await
    }

    /// Like `call`, for subcommands that block longer than the default timeout.
    async fn call_within(
        &self,
        operation: &str,
        service_args: &[&str],
        region: Option<&str>,
        timeout: Duration,
    ) -> Result<String, CloudError> {
        let output = self
            .runner
            .run_with_timeout("aws", &self.args(service_args, region), timeout)
            .await
            .context(CommandSnafu { operation })?;

        if output.success() {
            return Ok(output.stdout);
        }

        let message = output.failure_summary();
        if message.contains("NoSuch") || message.contains("NotFound") {
            return Err(CloudError::NotFound {
                resource: format!("{operation}: {message}"),
            });
        }
        Err(CloudError::api(operation, message))
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        service_args: &[&str],
        region: Option<&str>,
    ) -> Result<T, CloudError> {
        let stdout = self.call(operation, service_args, region).await?;
        parse(operation, &stdout)
    }
}

fn parse<T: DeserializeOwned>(operation: &str, stdout: &str) -> Result<T, CloudError> {
    // Some delete/update calls print nothing on success.
    let body = if stdout.trim().is_empty() { "{}" } else { stdout };
    serde_json::from_str(body).context(ParseSnafu { operation })
}

/// AWS list wrapper: `{ "Quantity": n, "Items": [...] }`.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

impl<T> Default for Items<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}
