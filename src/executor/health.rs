// ABOUTME: Post-deploy HTTP health validation.
// ABOUTME: Probes every configured URL concurrently with per-URL retries.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::time::Duration;

use super::ExecutorError;
use crate::config::{Config, HealthCheckConfig, HealthConfig};
use crate::types::Stage;

/// Decides whether a freshly deployed stage is serving correctly.
#[async_trait]
pub trait HealthProber: Send + Sync {
    /// `true` when every check for `stage` passed.
    async fn run_checks(&self, stage: Stage) -> Result<bool, ExecutorError>;
}

/// Probes URLs over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpHealthProber {
    client: reqwest::Client,
    settings: HealthConfig,
    checks: BTreeMap<Stage, Vec<HealthCheckConfig>>,
}

impl HttpHealthProber {
    pub fn new(
        settings: HealthConfig,
        checks: BTreeMap<Stage, Vec<HealthCheckConfig>>,
    ) -> Result<Self, ExecutorError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(concat!("stagecoach/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExecutorError::Probe(e.to_string()))?;

        Ok(Self {
            client,
            settings,
            checks,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ExecutorError> {
        let checks = config
            .stages
            .iter()
            .map(|(stage, stage_config)| (*stage, stage_config.health_checks.clone()))
            .collect();
        Self::new(config.health.clone(), checks)
    }

    async fn probe_once(&self, check: &HealthCheckConfig) -> Result<(), String> {
        let response = self
            .client
            .get(&check.url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();

        let ok = match check.expect_status {
            Some(expected) => status.as_u16() == expected,
            None => status.is_success() || status.is_redirection(),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("unexpected status {status}"))
        }
    }

    async fn probe(&self, check: &HealthCheckConfig) -> bool {
        let attempts = self.settings.retries.max(1);
        for attempt in 1..=attempts {
            match self.probe_once(check).await {
                Ok(()) => {
                    tracing::debug!("{} healthy (attempt {attempt})", check.url);
                    return true;
                }
                Err(reason) => {
                    tracing::debug!("{} attempt {attempt}/{attempts} failed: {reason}", check.url);
                    if attempt < attempts {
                        tokio::time::sleep(self.settings.interval).await;
                    }
                }
            }
        }
        tracing::warn!("{} failed health check after {attempts} attempts", check.url);
        false
    }
}

#[async_trait]
impl HealthProber for HttpHealthProber {
    async fn run_checks(&self, stage: Stage) -> Result<bool, ExecutorError> {
        let checks = self.checks.get(&stage).map(Vec::as_slice).unwrap_or(&[]);
        if checks.is_empty() {
            return Ok(true);
        }

        let all = join_all(checks.iter().map(|check| self.probe(check)));
        match tokio::time::timeout(self.settings.timeout, all).await {
            Ok(results) => Ok(results.into_iter().all(|healthy| healthy)),
            Err(_) => Err(ExecutorError::HealthTimeout(self.settings.timeout)),
        }
    }
}

/// Total worst-case probe time for one URL, for display.
pub fn probe_budget(settings: &HealthConfig) -> Duration {
    let attempts = settings.retries.max(1);
    settings.request_timeout * attempts + settings.interval * (attempts - 1)
}
