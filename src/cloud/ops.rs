// ABOUTME: Capability traits for the cloud provider, one per state domain.
// ABOUTME: The core consumes these; adapters implement them.

use async_trait::async_trait;

use super::error::CloudError;
use super::types::{Certificate, Distribution, DnsRecord, HostedZone, PriorConfig};
use crate::types::{DistributionId, InvalidationId, ZoneId, is_within_zone};

/// CDN distributions: read, invalidate, and the guarded delete path.
#[async_trait]
pub trait DistributionOps: Send + Sync {
    async fn list_distributions(&self) -> Result<Vec<Distribution>, CloudError>;

    async fn create_invalidation(
        &self,
        id: &DistributionId,
        paths: &[String],
    ) -> Result<InvalidationId, CloudError>;

    /// Disable a distribution. Required before deletion.
    async fn disable_distribution(&self, id: &DistributionId) -> Result<(), CloudError>;

    /// Block until pending changes to the distribution have propagated.
    async fn wait_until_deployed(&self, id: &DistributionId) -> Result<(), CloudError>;

    /// Delete a disabled, fully deployed distribution. Only called after
    /// `can_delete` and confirmation.
    async fn delete_distribution(&self, id: &DistributionId) -> Result<(), CloudError>;
}

/// DNS hosted zones and their records.
#[async_trait]
pub trait DnsOps: Send + Sync {
    async fn list_zones(&self) -> Result<Vec<HostedZone>, CloudError>;

    async fn get_dns_records(&self, zone_id: &ZoneId) -> Result<Vec<DnsRecord>, CloudError>;

    async fn create_zone(&self, domain: &str) -> Result<HostedZone, CloudError>;

    async fn delete_zone(&self, zone_id: &ZoneId) -> Result<(), CloudError>;
}

/// TLS certificates usable by the CDN.
#[async_trait]
pub trait CertificateOps: Send + Sync {
    async fn list_certificates(&self) -> Result<Vec<Certificate>, CloudError>;
}

/// Traffic redirection to a static placeholder during risky deploy phases.
#[async_trait]
pub trait MaintenanceOps: Send + Sync {
    /// Point the distribution at the placeholder and return what to restore.
    async fn enable(
        &self,
        distribution_id: &DistributionId,
        placeholder_url: &str,
    ) -> Result<PriorConfig, CloudError>;

    /// Restore the routing captured by `enable`.
    async fn disable(&self, prior: &PriorConfig) -> Result<(), CloudError>;
}

/// Credential probe used by preflight.
#[async_trait]
pub trait IdentityOps: Send + Sync {
    /// Identity (ARN or account) the credentials resolve to.
    async fn caller_identity(&self) -> Result<String, CloudError>;
}

/// Most specific hosted zone containing `domain`.
pub async fn find_zone_for(
    dns: &dyn DnsOps,
    domain: &str,
) -> Result<Option<HostedZone>, CloudError> {
    let zones = dns.list_zones().await?;
    Ok(zones
        .into_iter()
        .filter(|zone| is_within_zone(domain, &zone.name))
        .max_by_key(|zone| zone.name.len()))
}

/// Distributions answering for any of `domains`.
pub fn distributions_serving<'a>(
    distributions: &'a [Distribution],
    domains: &'a [String],
) -> impl Iterator<Item = &'a Distribution> + 'a {
    distributions
        .iter()
        .filter(move |dist| domains.iter().any(|domain| dist.serves(domain)))
}
