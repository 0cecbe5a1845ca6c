// ABOUTME: Maintenance window toggling on a CloudFront distribution.
// ABOUTME: Adds a placeholder origin, retargets the default behavior, and restores from a snapshot.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Value, json};

use super::AwsCli;
use crate::cloud::{CloudError, MaintenanceOps, PriorConfig};
use crate::types::DistributionId;

const MAINTENANCE_ORIGIN_ID: &str = "stagecoach-maintenance";

/// Rewrite a distribution config so all traffic goes to `placeholder_url`.
fn redirect_to_placeholder(config: &mut Value, placeholder_url: &str) -> Result<(), CloudError> {
    let invalid = |message: String| CloudError::api("maintenance enable", message);

    let url = Url::parse(placeholder_url)
        .map_err(|e| invalid(format!("invalid placeholder URL {placeholder_url}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| invalid(format!("placeholder URL {placeholder_url} has no host")))?;
    let path = url.path().trim_end_matches('/');
    let protocol = if url.scheme() == "http" {
        "http-only"
    } else {
        "https-only"
    };

    let origin = json!({
        "Id": MAINTENANCE_ORIGIN_ID,
        "DomainName": host,
        "OriginPath": path,
        "CustomHeaders": { "Quantity": 0 },
        "CustomOriginConfig": {
            "HTTPPort": 80,
            "HTTPSPort": 443,
            "OriginProtocolPolicy": protocol,
            "OriginSslProtocols": { "Quantity": 1, "Items": ["TLSv1.2"] },
            "OriginReadTimeout": 30,
            "OriginKeepaliveTimeout": 5
        },
        "ConnectionAttempts": 3,
        "ConnectionTimeout": 10
    });

    let items = config
        .pointer_mut("/Origins/Items")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| invalid("distribution config has no origins".to_string()))?;
    items.retain(|o| o.get("Id").and_then(Value::as_str) != Some(MAINTENANCE_ORIGIN_ID));
    items.push(origin);
    let quantity = items.len();
    config["Origins"]["Quantity"] = json!(quantity);

    let target = config
        .pointer_mut("/DefaultCacheBehavior/TargetOriginId")
        .ok_or_else(|| invalid("distribution config has no default cache behavior".to_string()))?;
    *target = json!(MAINTENANCE_ORIGIN_ID);
    Ok(())
}

#[async_trait]
impl MaintenanceOps for AwsCli {
    async fn enable(
        &self,
        distribution_id: &DistributionId,
        placeholder_url: &str,
    ) -> Result<PriorConfig, CloudError> {
        let current = self.distribution_config(distribution_id).await?;
        let prior = PriorConfig {
            distribution_id: distribution_id.clone(),
            snapshot: current.distribution_config.clone(),
        };

        let mut config = current.distribution_config;
        redirect_to_placeholder(&mut config, placeholder_url)?;
        self.update_distribution(distribution_id, &current.etag, &config)
            .await?;
        tracing::debug!("distribution {distribution_id} now serving {placeholder_url}");
        Ok(prior)
    }

    async fn disable(&self, prior: &PriorConfig) -> Result<(), CloudError> {
        // The ETag changed when maintenance was enabled; fetch the current one.
        let current = self.distribution_config(&prior.distribution_id).await?;
        self.update_distribution(&prior.distribution_id, &current.etag, &prior.snapshot)
            .await?;
        tracing::debug!("distribution {} routing restored", prior.distribution_id);
        Ok(())
    }
}
