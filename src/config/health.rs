// ABOUTME: Post-deploy health validation configuration.
// ABOUTME: Defines HTTP check targets and retry parameters with sensible defaults.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthCheckConfig {
    pub url: String,

    /// Exact status to expect. Any 2xx/3xx passes when unset.
    #[serde(default)]
    pub expect_status: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Upper bound for the whole validation phase.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retries: default_retries(),
            interval: default_interval(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_retries() -> u32 {
    3
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}
