// ABOUTME: Per-stage desired configuration: domains, DNS zone and health checks.
// ABOUTME: This is the "desired state" side of every reconciliation.

use serde::Deserialize;

use super::health::HealthCheckConfig;
use crate::types::normalize_domain;

#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// Primary domain served by this stage.
    pub domain: String,

    /// Additional hostnames the CDN distribution should answer for.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Hosted zone holding the stage's records. Derived from the domain when absent.
    #[serde(default)]
    pub hosted_zone: Option<String>,

    #[serde(default)]
    pub health_checks: Vec<HealthCheckConfig>,

    /// Overrides `preflight.require_clean_git` for this stage.
    #[serde(default)]
    pub require_clean_git: Option<bool>,

    /// Price class expected on the distribution.
    #[serde(default)]
    pub price_class: Option<String>,
}

impl StageConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            aliases: Vec::new(),
            hosted_zone: None,
            health_checks: Vec::new(),
            require_clean_git: None,
            price_class: None,
        }
    }

    /// Normalized primary domain followed by normalized aliases, without duplicates.
    pub fn domains(&self) -> Vec<String> {
        let mut domains = vec![normalize_domain(&self.domain)];
        for alias in &self.aliases {
            let alias = normalize_domain(alias);
            if !domains.contains(&alias) {
                domains.push(alias);
            }
        }
        domains
    }

    /// Hosted zone name, falling back to the registrable part of the domain.
    pub fn zone_name(&self) -> String {
        if let Some(zone) = &self.hosted_zone {
            return normalize_domain(zone);
        }
        let domain = normalize_domain(&self.domain);
        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() <= 2 {
            domain
        } else {
            labels[labels.len() - 2..].join(".")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains_are_normalized_and_deduplicated() {
        let mut stage = StageConfig::new("Example.com.");
        stage.aliases = vec!["www.example.com".into(), "example.com".into()];
        assert_eq!(stage.domains(), vec!["example.com", "www.example.com"]);
    }

    #[test]
    fn zone_name_derives_from_domain() {
        assert_eq!(StageConfig::new("staging.example.com").zone_name(), "example.com");
        assert_eq!(StageConfig::new("example.com").zone_name(), "example.com");

        let mut stage = StageConfig::new("app.example.co.uk");
        stage.hosted_zone = Some("example.co.uk.".into());
        assert_eq!(stage.zone_name(), "example.co.uk");
    }
}
