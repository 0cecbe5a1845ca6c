// ABOUTME: Test support utilities.
// ABOUTME: In-memory cloud, executor and prober fakes plus config and context builders.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use stagecoach::applicable::Applicable;
use stagecoach::cloud::{
    Certificate, CertificateOps, CloudError, Distribution, DistributionOps, DnsOps, DnsRecord,
    HostedZone, IdentityOps, MaintenanceOps, PriorConfig,
};
use stagecoach::config::Config;
use stagecoach::confirm::Confirm;
use stagecoach::deploy::{CloudClients, DeployContext, lock_manager};
use stagecoach::executor::{
    DeployExecutor, DeployOutput, ExecutorError, HealthProber, PreflightCheck, PreflightError,
};
use stagecoach::types::{DistributionId, InvalidationId, Stage, ZoneId};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("stagecoach=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const STAGING_DIST: &str = "E1STAGINGDIST01";

pub fn config_yaml(extra: &str) -> String {
    format!(
        r#"project: site
stages:
  staging:
    domain: staging.example.com
    health_checks:
      - url: https://staging.example.com/
  production:
    domain: example.com
    aliases:
      - www.example.com
deploy:
  command: ["true"]
preflight:
  check_credentials: false
{extra}"#
    )
}

pub fn config(extra: &str) -> Config {
    Config::from_yaml(&config_yaml(extra)).unwrap()
}

pub fn distribution(id: &str, origin: &str, aliases: &[&str]) -> Distribution {
    Distribution {
        id: DistributionId::new(id),
        domain_name: format!("{}.cloudfront.net", id.to_ascii_lowercase()),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        origins: vec![origin.to_string()],
        enabled: true,
        status: "Deployed".to_string(),
        price_class: None,
        certificate_arn: None,
        created_time: None,
        last_modified_time: None,
    }
}

/// Distribution serving the staging domain from a real origin.
pub fn staging_distribution() -> Distribution {
    distribution(STAGING_DIST, "site-assets.s3.amazonaws.com", &["staging.example.com"])
}

/// In-memory cloud account. Every mutating call is recorded.
#[derive(Default)]
pub struct FakeCloud {
    pub distributions: Mutex<Vec<Distribution>>,
    pub zones: Mutex<Vec<HostedZone>>,
    pub records: Mutex<HashMap<ZoneId, Vec<DnsRecord>>>,
    pub certificates: Vec<Certificate>,
    pub calls: Mutex<Vec<String>>,
    pub fail_list: bool,
    pub fail_invalidation: bool,
    pub fail_maintenance_disable: bool,
    pub fail_delete: Vec<String>,
    /// Disabled distributions whose change has not propagated yet.
    pub propagating: Mutex<Vec<DistributionId>>,
}

impl FakeCloud {
    pub fn with_distributions(distributions: Vec<Distribution>) -> Self {
        Self {
            distributions: Mutex::new(distributions),
            ..Self::default()
        }
    }

    pub fn add_zone(&self, id: &str, name: &str, records: Vec<DnsRecord>) {
        let zone_id = ZoneId::new(id);
        self.zones.lock().push(HostedZone {
            id: zone_id.clone(),
            name: name.to_string(),
            record_count: Some(records.len() as u64),
        });
        self.records.lock().insert(zone_id, records);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls.lock().iter().any(|c| c.starts_with(prefix))
    }

    fn log(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl DistributionOps for FakeCloud {
    async fn list_distributions(&self) -> Result<Vec<Distribution>, CloudError> {
        if self.fail_list {
            return Err(CloudError::api("list-distributions", "throttled"));
        }
        Ok(self.distributions.lock().clone())
    }

    async fn create_invalidation(
        &self,
        id: &DistributionId,
        paths: &[String],
    ) -> Result<InvalidationId, CloudError> {
        self.log(format!("invalidate {id} {}", paths.join(",")));
        if self.fail_invalidation {
            return Err(CloudError::api("create-invalidation", "too many invalidations"));
        }
        Ok(InvalidationId::new("I2J0I21PCUYOIK"))
    }

    async fn disable_distribution(&self, id: &DistributionId) -> Result<(), CloudError> {
        self.log(format!("disable {id}"));
        self.propagating.lock().push(id.clone());
        Ok(())
    }

    async fn wait_until_deployed(&self, id: &DistributionId) -> Result<(), CloudError> {
        self.log(format!("wait {id}"));
        self.propagating.lock().retain(|p| p != id);
        Ok(())
    }

    async fn delete_distribution(&self, id: &DistributionId) -> Result<(), CloudError> {
        self.log(format!("delete {id}"));
        if self.propagating.lock().contains(id) {
            return Err(CloudError::api("delete-distribution", "DistributionNotDisabled"));
        }
        if self.fail_delete.iter().any(|f| f == id.as_str()) {
            return Err(CloudError::api("delete-distribution", "DistributionNotDisabled"));
        }
        self.distributions.lock().retain(|d| &d.id != id);
        Ok(())
    }
}

#[async_trait]
impl DnsOps for FakeCloud {
    async fn list_zones(&self) -> Result<Vec<HostedZone>, CloudError> {
        Ok(self.zones.lock().clone())
    }

    async fn get_dns_records(&self, zone_id: &ZoneId) -> Result<Vec<DnsRecord>, CloudError> {
        self.records
            .lock()
            .get(zone_id)
            .cloned()
            .ok_or_else(|| CloudError::NotFound {
                resource: format!("hosted zone {zone_id}"),
            })
    }

    async fn create_zone(&self, domain: &str) -> Result<HostedZone, CloudError> {
        self.log(format!("create-zone {domain}"));
        let id = format!("Z{:0>12}", self.zones.lock().len() + 1);
        let apex = vec![
            DnsRecord::plain(domain, "NS", vec!["ns-1.awsdns-01.org".into()]),
            DnsRecord::plain(domain, "SOA", vec!["ns-1.awsdns-01.org. 1 7200 900 1209600 86400".into()]),
        ];
        self.add_zone(&id, domain, apex);
        Ok(HostedZone {
            id: ZoneId::new(id),
            name: domain.to_string(),
            record_count: Some(2),
        })
    }

    async fn delete_zone(&self, zone_id: &ZoneId) -> Result<(), CloudError> {
        self.log(format!("delete-zone {zone_id}"));
        self.zones.lock().retain(|z| &z.id != zone_id);
        self.records.lock().remove(zone_id);
        Ok(())
    }
}

#[async_trait]
impl CertificateOps for FakeCloud {
    async fn list_certificates(&self) -> Result<Vec<Certificate>, CloudError> {
        Ok(self.certificates.clone())
    }
}

#[async_trait]
impl MaintenanceOps for FakeCloud {
    async fn enable(
        &self,
        distribution_id: &DistributionId,
        placeholder_url: &str,
    ) -> Result<PriorConfig, CloudError> {
        self.log(format!("maintenance-on {distribution_id} {placeholder_url}"));
        Ok(PriorConfig {
            distribution_id: distribution_id.clone(),
            snapshot: serde_json::json!({ "Origins": ["site-assets.s3.amazonaws.com"] }),
        })
    }

    async fn disable(&self, prior: &PriorConfig) -> Result<(), CloudError> {
        self.log(format!("maintenance-off {}", prior.distribution_id));
        if self.fail_maintenance_disable {
            return Err(CloudError::api("update-distribution", "PreconditionFailed"));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityOps for FakeCloud {
    async fn caller_identity(&self) -> Result<String, CloudError> {
        Ok("arn:aws:iam::123456789012:user/deployer".to_string())
    }
}

pub fn clients(cloud: &Arc<FakeCloud>) -> CloudClients {
    CloudClients {
        cdn: cloud.clone(),
        certificates: cloud.clone(),
        dns: cloud.clone(),
        maintenance: cloud.clone(),
        identity: cloud.clone(),
    }
}

/// Scripted build and deploy outcomes.
#[derive(Default)]
pub struct FakeExecutor {
    pub fail_build: bool,
    pub fail_deploy: bool,
    pub distribution_id: Option<DistributionId>,
    pub calls: Mutex<Vec<String>>,
    /// File the deploy step overwrites with garbage before running.
    pub corrupt_on_deploy: Mutex<Option<PathBuf>>,
}

impl FakeExecutor {
    pub fn deploying(id: &str) -> Self {
        Self {
            distribution_id: Some(DistributionId::new(id)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl DeployExecutor for FakeExecutor {
    async fn run_build(&self) -> Result<Applicable<()>, ExecutorError> {
        self.calls.lock().push("build".to_string());
        if self.fail_build {
            return Err(ExecutorError::Failed {
                step: "build".to_string(),
                code: 1,
                summary: "tsc: 3 errors".to_string(),
            });
        }
        Ok(Applicable::Applied(()))
    }

    async fn execute_deploy(&self, stage: Stage, dry_run: bool) -> Result<DeployOutput, ExecutorError> {
        self.calls
            .lock()
            .push(format!("deploy {stage} dry_run={dry_run}"));
        if let Some(path) = self.corrupt_on_deploy.lock().as_ref() {
            std::fs::write(path, "not json").unwrap();
        }
        if self.fail_deploy {
            return Err(ExecutorError::Failed {
                step: "deploy".to_string(),
                code: 2,
                summary: "stack update failed".to_string(),
            });
        }
        Ok(DeployOutput {
            distribution_id: self.distribution_id.clone(),
        })
    }
}

/// Health prober with a fixed verdict.
pub struct FakeHealth {
    pub healthy: bool,
    pub calls: Mutex<u32>,
}

impl FakeHealth {
    pub fn new(healthy: bool) -> Self {
        Self {
            healthy,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl HealthProber for FakeHealth {
    async fn run_checks(&self, _stage: Stage) -> Result<bool, ExecutorError> {
        *self.calls.lock() += 1;
        Ok(self.healthy)
    }
}

/// Preflight check that always fails.
pub struct FailingCheck;

#[async_trait]
impl PreflightCheck for FailingCheck {
    fn name(&self) -> &str {
        "credentials"
    }

    async fn run(&self, _stage: Stage) -> Result<Applicable<()>, PreflightError> {
        Err(PreflightError::new("credentials", "token expired"))
    }
}

/// Answers every prompt the same way and remembers the questions.
pub struct ScriptedConfirm {
    answer: bool,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.lock().len()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, message: &str) -> bool {
        self.asked.lock().push(message.to_string());
        self.answer
    }
}

/// Pipeline context wired to fakes, with state under `root`.
pub struct TestContext {
    pub cloud: Arc<FakeCloud>,
    pub executor: Arc<FakeExecutor>,
    pub health: Arc<FakeHealth>,
    pub preflight: Vec<Box<dyn PreflightCheck>>,
}

impl TestContext {
    pub fn new(cloud: FakeCloud, executor: FakeExecutor, health: FakeHealth) -> Self {
        Self {
            cloud: Arc::new(cloud),
            executor: Arc::new(executor),
            health: Arc::new(health),
            preflight: Vec::new(),
        }
    }

    pub fn with_preflight(mut self, check: Box<dyn PreflightCheck>) -> Self {
        self.preflight.push(check);
        self
    }

    pub fn build(self, config: Config, root: &Path) -> DeployContext {
        DeployContext {
            locks: lock_manager(&config, root),
            executor: self.executor,
            health: self.health,
            cloud: clients(&self.cloud),
            preflight: self.preflight,
            project_root: root.to_path_buf(),
            config,
        }
    }
}
