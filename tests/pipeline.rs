// ABOUTME: Integration tests for the deployment pipeline against in-memory collaborators.
// ABOUTME: Verifies lock and maintenance cleanup on every failure path.

mod support;

use stagecoach::deploy::{DeployContext, DeployErrorKind, DeployOptions, run};
use stagecoach::diagnostics::WarningKind;
use stagecoach::output::{Output, OutputMode};
use stagecoach::types::{DistributionId, Stage};
use std::sync::Arc;
use support::{
    FailingCheck, FakeCloud, FakeExecutor, FakeHealth, STAGING_DIST, TestContext, config,
    staging_distribution,
};

const MAINTENANCE: &str = "maintenance:\n  placeholder_url: https://maintenance.example.com/index.html\n";

fn quiet() -> Output {
    Output::new(OutputMode::Quiet)
}

struct Harness {
    _dir: tempfile::TempDir,
    ctx: DeployContext,
    cloud: Arc<FakeCloud>,
    executor: Arc<FakeExecutor>,
    health: Arc<FakeHealth>,
}

fn harness(test: TestContext, extra_config: &str) -> Harness {
    support::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let cloud = test.cloud.clone();
    let executor = test.executor.clone();
    let health = test.health.clone();
    let ctx = test.build(config(extra_config), dir.path());
    Harness {
        _dir: dir,
        ctx,
        cloud,
        executor,
        health,
    }
}

fn standard() -> TestContext {
    TestContext::new(
        FakeCloud::with_distributions(vec![staging_distribution()]),
        FakeExecutor::deploying(STAGING_DIST),
        FakeHealth::new(true),
    )
}

#[tokio::test]
async fn successful_deploy_releases_lock_and_invalidates() {
    let h = harness(standard(), "");

    let result = run(&h.ctx, Stage::Staging, DeployOptions::default(), &quiet())
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.completed.locked);
    assert!(result.completed.released);
    assert!(result.completed.invalidated);
    assert!(result.completed.audited);
    assert_eq!(result.distribution_id, Some(DistributionId::new(STAGING_DIST)));
    assert!(h.ctx.locks.get_file_lock(Stage::Staging).unwrap().is_none());
    assert_eq!(
        h.cloud.calls(),
        vec![format!("invalidate {STAGING_DIST} /*")]
    );
    assert_eq!(*h.health.calls.lock(), 1);
}

#[tokio::test]
async fn contention_fails_without_running_anything() {
    let h = harness(standard(), "");
    let held = h.ctx.locks.acquire_lock(Stage::Staging).unwrap();

    let failure = run(&h.ctx, Stage::Staging, DeployOptions::default(), &quiet())
        .await
        .unwrap_err();

    assert_eq!(failure.error.kind(), DeployErrorKind::LockContention);
    assert!(h.executor.calls().is_empty());
    assert_eq!(h.ctx.locks.get_file_lock(Stage::Staging).unwrap(), Some(held));
    let error = failure.result.error.as_ref().unwrap();
    assert!(error.recovery.iter().any(|cmd| cmd.contains("recover staging")));
}

#[tokio::test]
async fn preflight_failure_never_takes_the_lock() {
    let h = harness(standard().with_preflight(Box::new(FailingCheck)), "");

    let failure = run(&h.ctx, Stage::Staging, DeployOptions::default(), &quiet())
        .await
        .unwrap_err();

    assert_eq!(failure.error.kind(), DeployErrorKind::PreflightFailure);
    assert!(!failure.result.completed.locked);
    assert!(h.executor.calls().is_empty());
    assert!(h.ctx.locks.get_file_lock(Stage::Staging).unwrap().is_none());
}

#[tokio::test]
async fn build_failure_releases_the_lock() {
    let mut executor = FakeExecutor::deploying(STAGING_DIST);
    executor.fail_build = true;
    let h = harness(
        TestContext::new(
            FakeCloud::with_distributions(vec![staging_distribution()]),
            executor,
            FakeHealth::new(true),
        ),
        "",
    );

    let failure = run(&h.ctx, Stage::Staging, DeployOptions::default(), &quiet())
        .await
        .unwrap_err();

    assert_eq!(failure.error.kind(), DeployErrorKind::DeployDelegateFailure);
    assert!(failure.result.completed.locked);
    assert!(failure.result.completed.released);
    assert!(!failure.result.success);
    assert_eq!(h.executor.calls(), vec!["build".to_string()]);
    assert!(h.ctx.locks.get_file_lock(Stage::Staging).unwrap().is_none());
}

#[tokio::test]
async fn unreleasable_lock_is_a_warning_not_the_error() {
    let mut executor = FakeExecutor::deploying(STAGING_DIST);
    executor.fail_deploy = true;
    let h = harness(
        TestContext::new(
            FakeCloud::with_distributions(vec![staging_distribution()]),
            executor,
            FakeHealth::new(true),
        ),
        "",
    );
    *h.executor.corrupt_on_deploy.lock() =
        Some(h.ctx.locks.store().lock_path(Stage::Staging));

    let failure = run(&h.ctx, Stage::Staging, DeployOptions::default(), &quiet())
        .await
        .unwrap_err();

    assert_eq!(failure.error.kind(), DeployErrorKind::DeployDelegateFailure);
    assert!(failure.result.completed.locked);
    assert!(!failure.result.completed.released);
    let release_warnings: Vec<_> = failure
        .result
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::LockRelease)
        .collect();
    assert_eq!(release_warnings.len(), 1);
    assert!(release_warnings[0].message.contains("stagecoach recover staging"));
}

#[tokio::test]
async fn unhealthy_deploy_restores_maintenance_and_releases() {
    let h = harness(
        TestContext::new(
            FakeCloud::with_distributions(vec![staging_distribution()]),
            FakeExecutor::deploying(STAGING_DIST),
            FakeHealth::new(false),
        ),
        MAINTENANCE,
    );
    let options = DeployOptions {
        maintenance: true,
        ..DeployOptions::default()
    };

    let failure = run(&h.ctx, Stage::Staging, options, &quiet())
        .await
        .unwrap_err();

    assert_eq!(failure.error.kind(), DeployErrorKind::HealthValidationFailure);
    assert_eq!(
        h.cloud.calls(),
        vec![
            format!("maintenance-on {STAGING_DIST} https://maintenance.example.com/index.html"),
            format!("maintenance-off {STAGING_DIST}"),
        ]
    );
    assert!(failure.result.completed.maintenance_restored);
    assert!(!failure.result.completed.invalidated);
    assert!(h.ctx.locks.get_file_lock(Stage::Staging).unwrap().is_none());
}

#[tokio::test]
async fn failed_restore_is_a_warning_not_the_error() {
    let mut cloud = FakeCloud::with_distributions(vec![staging_distribution()]);
    cloud.fail_maintenance_disable = true;
    let mut executor = FakeExecutor::deploying(STAGING_DIST);
    executor.fail_deploy = true;
    let h = harness(
        TestContext::new(cloud, executor, FakeHealth::new(true)),
        MAINTENANCE,
    );
    let options = DeployOptions {
        maintenance: true,
        ..DeployOptions::default()
    };

    let failure = run(&h.ctx, Stage::Staging, options, &quiet())
        .await
        .unwrap_err();

    assert_eq!(failure.error.kind(), DeployErrorKind::DeployDelegateFailure);
    assert!(
        failure
            .result
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::MaintenanceRestore)
    );
    assert!(h.ctx.locks.get_file_lock(Stage::Staging).unwrap().is_none());
}

#[tokio::test]
async fn maintenance_restore_failure_after_healthy_deploy_fails_the_run() {
    let mut cloud = FakeCloud::with_distributions(vec![staging_distribution()]);
    cloud.fail_maintenance_disable = true;
    let h = harness(
        TestContext::new(cloud, FakeExecutor::deploying(STAGING_DIST), FakeHealth::new(true)),
        MAINTENANCE,
    );
    let options = DeployOptions {
        maintenance: true,
        ..DeployOptions::default()
    };

    let failure = run(&h.ctx, Stage::Staging, options, &quiet())
        .await
        .unwrap_err();

    assert_eq!(failure.error.kind(), DeployErrorKind::MaintenanceFailure);
    assert!(h.ctx.locks.get_file_lock(Stage::Staging).unwrap().is_none());
}

#[tokio::test]
async fn maintenance_requires_its_config_section() {
    let h = harness(standard(), "");
    let options = DeployOptions {
        maintenance: true,
        ..DeployOptions::default()
    };

    let failure = run(&h.ctx, Stage::Staging, options, &quiet())
        .await
        .unwrap_err();

    assert_eq!(failure.error.kind(), DeployErrorKind::Configuration);
    assert!(h.executor.calls().is_empty());
}

#[tokio::test]
async fn maintenance_without_distribution_warns_and_deploys() {
    let h = harness(
        TestContext::new(FakeCloud::default(), FakeExecutor::default(), FakeHealth::new(true)),
        MAINTENANCE,
    );
    let options = DeployOptions {
        maintenance: true,
        ..DeployOptions::default()
    };

    let result = run(&h.ctx, Stage::Staging, options, &quiet())
        .await
        .unwrap();

    assert!(result.success);
    assert!(!h.cloud.called("maintenance-on"));
    let kinds: Vec<WarningKind> = result.warnings.iter().map(|w| w.kind).collect();
    assert!(kinds.contains(&WarningKind::MaintenanceSkipped));
    assert!(kinds.contains(&WarningKind::CacheInvalidation));
}

#[tokio::test]
async fn dry_run_takes_no_lock_and_mutates_nothing() {
    let h = harness(standard(), MAINTENANCE);
    let options = DeployOptions {
        dry_run: true,
        maintenance: true,
        show_diff: false,
    };

    let result = run(&h.ctx, Stage::Staging, options, &quiet())
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.dry_run);
    assert!(!result.completed.locked);
    assert!(!result.completed.invalidated);
    assert_eq!(
        result.simulated_health_checks,
        vec!["https://staging.example.com/".to_string()]
    );
    assert_eq!(
        h.executor.calls(),
        vec!["build".to_string(), "deploy staging dry_run=true".to_string()]
    );
    assert!(h.cloud.calls().is_empty());
    assert_eq!(*h.health.calls.lock(), 0);
}

#[tokio::test]
async fn invalidation_failure_is_only_a_warning() {
    let mut cloud = FakeCloud::with_distributions(vec![staging_distribution()]);
    cloud.fail_invalidation = true;
    let h = harness(
        TestContext::new(cloud, FakeExecutor::deploying(STAGING_DIST), FakeHealth::new(true)),
        "",
    );

    let result = run(&h.ctx, Stage::Staging, DeployOptions::default(), &quiet())
        .await
        .unwrap();

    assert!(result.success);
    assert!(!result.completed.invalidated);
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::CacheInvalidation)
    );
}

#[tokio::test]
async fn show_diff_attaches_the_diff() {
    let h = harness(standard(), "");
    let options = DeployOptions {
        show_diff: true,
        ..DeployOptions::default()
    };

    let result = run(&h.ctx, Stage::Staging, options, &quiet())
        .await
        .unwrap();

    let diff = result.diff.expect("diff recorded");
    assert_eq!(diff.stage, Stage::Staging);
}

#[tokio::test]
async fn unconfigured_stage_is_rejected_up_front() {
    let yaml = "project: site\nstages:\n  staging:\n    domain: staging.example.com\ndeploy:\n  command: [\"true\"]\n";
    let dir = tempfile::tempdir().unwrap();
    let test = standard();
    let executor = test.executor.clone();
    let ctx = test.build(
        stagecoach::config::Config::from_yaml(yaml).unwrap(),
        dir.path(),
    );

    let failure = run(&ctx, Stage::Production, DeployOptions::default(), &quiet())
        .await
        .unwrap_err();

    assert_eq!(failure.error.kind(), DeployErrorKind::Configuration);
    assert!(executor.calls().is_empty());
    assert!(ctx.locks.get_file_lock(Stage::Production).unwrap().is_none());
}
