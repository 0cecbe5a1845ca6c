// ABOUTME: CloudFront distribution listing, invalidation, disable and delete.
// ABOUTME: Maps list-distributions summaries into Distribution snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use snafu::ResultExt;
use std::time::Duration;

use super::{AwsCli, Items, parse};
use crate::cloud::error::ParseSnafu;
use crate::cloud::{CloudError, Distribution, DistributionOps};
use crate::types::{CertificateArn, DistributionId, InvalidationId};

/// CloudFront propagation routinely takes 5 to 15 minutes.
const DEPLOY_WAIT_TIMEOUT: Duration = Duration::from_secs(40 * 60);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListResponse {
    #[serde(default)]
    distribution_list: Option<DistributionList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionList {
    #[serde(default)]
    items: Vec<DistributionSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionSummary {
    id: String,
    domain_name: String,
    status: String,
    enabled: bool,
    #[serde(default)]
    aliases: Items<String>,
    #[serde(default)]
    origins: Items<Origin>,
    #[serde(default)]
    price_class: Option<String>,
    #[serde(default)]
    viewer_certificate: Option<ViewerCertificate>,
    #[serde(default)]
    last_modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Origin {
    domain_name: String,
}

#[derive(Debug, Deserialize)]
struct ViewerCertificate {
    #[serde(rename = "ACMCertificateArn", default)]
    acm_certificate_arn: Option<String>,
}

impl From<DistributionSummary> for Distribution {
    fn from(summary: DistributionSummary) -> Self {
        Distribution {
            id: DistributionId::new(summary.id),
            domain_name: summary.domain_name,
            aliases: summary.aliases.items,
            origins: summary
                .origins
                .items
                .into_iter()
                .map(|origin| origin.domain_name)
                .collect(),
            enabled: summary.enabled,
            status: summary.status,
            price_class: summary.price_class,
            certificate_arn: summary
                .viewer_certificate
                .and_then(|cert| cert.acm_certificate_arn)
                .map(CertificateArn::new),
            // Summaries carry no creation time; age falls back to last modification.
            created_time: None,
            last_modified_time: summary.last_modified_time,
        }
    }
}

/// `get-distribution-config` response: the editable config plus its ETag.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct DistributionConfigResponse {
    #[serde(rename = "ETag")]
    pub etag: String,
    pub distribution_config: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InvalidationResponse {
    invalidation: Invalidation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Invalidation {
    id: String,
}

pub(super) fn parse_distributions(stdout: &str) -> Result<Vec<Distribution>, CloudError> {
    let response: ListResponse = parse("cloudfront list-distributions", stdout)?;
    Ok(response
        .distribution_list
        .map(|list| list.items.into_iter().map(Distribution::from).collect())
        .unwrap_or_default())
}

impl AwsCli {
    pub(super) async fn distribution_config(
        &self,
        id: &DistributionId,
    ) -> Result<DistributionConfigResponse, CloudError> {
        self.call_json(
            "cloudfront get-distribution-config",
            &["cloudfront", "get-distribution-config", "--id", id.as_str()],
            None,
        )
        .await
    }

    pub(super) async fn update_distribution(
        &self,
        id: &DistributionId,
        etag: &str,
        config: &serde_json::Value,
    ) -> Result<(), CloudError> {
        let operation = "cloudfront update-distribution";
        let config = serde_json::to_string(config).context(ParseSnafu { operation })?;
        self.call(
            operation,
            &[
                "cloudfront",
                "update-distribution",
                "--id",
                id.as_str(),
                "--if-match",
                etag,
                "--distribution-config",
                &config,
            ],
            None,
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl DistributionOps for AwsCli {
    async fn list_distributions(&self) -> Result<Vec<Distribution>, CloudError> {
        let stdout = self
            .call(
                "cloudfront list-distributions",
                &["cloudfront", "list-distributions"],
                None,
            )
            .await?;
        parse_distributions(&stdout)
    }

    async fn create_invalidation(
        &self,
        id: &DistributionId,
        paths: &[String],
    ) -> Result<InvalidationId, CloudError> {
        let mut args = vec![
            "cloudfront",
            "create-invalidation",
            "--distribution-id",
            id.as_str(),
            "--paths",
        ];
        args.extend(paths.iter().map(String::as_str));

        let response: InvalidationResponse = self
            .call_json("cloudfront create-invalidation", &args, None)
            .await?;
        Ok(InvalidationId::new(response.invalidation.id))
    }

    async fn disable_distribution(&self, id: &DistributionId) -> Result<(), CloudError> {
        let current = self.distribution_config(id).await?;
        let mut config = current.distribution_config;
        if config.get("Enabled").and_then(|v| v.as_bool()) == Some(false) {
            tracing::debug!("distribution {id} already disabled");
            return Ok(());
        }
        config["Enabled"] = serde_json::Value::Bool(false);
        self.update_distribution(id, &current.etag, &config).await
    }

    async fn wait_until_deployed(&self, id: &DistributionId) -> Result<(), CloudError> {
        tracing::info!("waiting for distribution {id} to finish deploying");
        self.call_within(
            "cloudfront wait distribution-deployed",
            &["cloudfront", "wait", "distribution-deployed", "--id", id.as_str()],
            None,
            DEPLOY_WAIT_TIMEOUT,
        )
        .await
        .map(|_| ())
    }

    async fn delete_distribution(&self, id: &DistributionId) -> Result<(), CloudError> {
        let current = self.distribution_config(id).await?;
        self.call(
            "cloudfront delete-distribution",
            &[
                "cloudfront",
                "delete-distribution",
                "--id",
                id.as_str(),
                "--if-match",
                &current.etag,
            ],
            None,
        )
        .await
        .map(|_| ())
    }
}
