// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, defaults, stage lookups and discovery.

use stagecoach::config::*;
use stagecoach::error::Error;
use stagecoach::types::Stage;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
project: site
stages:
  production:
    domain: example.com
deploy:
  command: ["npx", "sst", "deploy", "--stage", "{stage}"]
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.project.as_str(), "site");
        assert_eq!(config.stages.len(), 1);
        assert!(config.build.is_none());
        assert!(config.maintenance.is_none());
        assert!(config.pulumi.is_none());
        assert_eq!(config.placeholder_origin, DEFAULT_PLACEHOLDER_ORIGIN);
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
project: site

stages:
  staging:
    domain: staging.example.com
    health_checks:
      - url: https://staging.example.com/
        expect_status: 200
  production:
    domain: example.com
    aliases: [www.example.com]
    hosted_zone: example.com
    require_clean_git: true
    price_class: PriceClass_100

build:
  command: ["npm", "run", "build"]
  timeout: 5m

deploy:
  command: ["npx", "sst", "deploy", "--stage", "{stage}"]
  preview_command: ["npx", "sst", "diff", "--stage", "{stage}"]
  distribution_output_key: cdnId
  timeout: 20m

lock:
  ttl: 45m

health:
  timeout: 90s
  retries: 5
  interval: 2s

maintenance:
  placeholder_url: https://maintenance.example.com/index.html

placeholder_origin: placeholder.example.net

preflight:
  check_credentials: false
  test_command: ["npm", "test"]

invalidation:
  paths: ["/index.html", "/assets/*"]

pulumi:
  backend_dir: .pulumi-state
  project: site-infra

aws:
  profile: deploy
  region: eu-west-1

zones:
  stale_after: 14days
"#;
        let config = Config::from_yaml(yaml).unwrap();

        let production = config.stage(Stage::Production).unwrap();
        assert_eq!(
            production.domains(),
            vec!["example.com".to_string(), "www.example.com".to_string()]
        );
        assert_eq!(production.price_class.as_deref(), Some("PriceClass_100"));
        let staging = config.stage(Stage::Staging).unwrap();
        assert_eq!(staging.health_checks[0].expect_status, Some(200));

        assert_eq!(config.build.as_ref().unwrap().timeout, Duration::from_secs(300));
        assert_eq!(config.deploy.distribution_output_key, "cdnId");
        assert!(config.deploy.preview_command.is_some());
        assert_eq!(config.lock.ttl, Duration::from_secs(45 * 60));
        assert_eq!(config.health.retries, 5);
        assert_eq!(config.health.interval, Duration::from_secs(2));
        assert_eq!(config.invalidation.paths.len(), 2);
        assert_eq!(config.pulumi_project(), "site-infra");
        assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.zones.stale_after, Duration::from_secs(14 * 24 * 60 * 60));
    }

    #[test]
    fn defaults_fill_omitted_sections() {
        let config = Config::from_yaml(
            "project: site\nstages:\n  staging:\n    domain: staging.example.com\ndeploy:\n  command: [\"true\"]\n",
        )
        .unwrap();

        assert_eq!(config.lock.ttl, Duration::from_secs(30 * 60));
        assert_eq!(config.lock_ttl(), chrono::Duration::minutes(30));
        assert_eq!(config.health.retries, 3);
        assert!(config.preflight.check_credentials);
        assert_eq!(config.invalidation.paths.head, "/*");
        assert_eq!(config.deploy.distribution_output_key, "distributionId");
        assert_eq!(config.pulumi_project(), "site");
    }
}

mod validation {
    use super::*;

    #[test]
    fn rejects_config_without_stages() {
        let err = Config::from_yaml("project: site\nstages: {}\ndeploy:\n  command: [\"true\"]\n")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn rejects_unknown_stage_name() {
        let yaml = "project: site\nstages:\n  qa:\n    domain: qa.example.com\ndeploy:\n  command: [\"true\"]\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn rejects_invalid_project_name() {
        let yaml = "project: My Site\nstages:\n  staging:\n    domain: staging.example.com\ndeploy:\n  command: [\"true\"]\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn rejects_empty_deploy_command() {
        let yaml = "project: site\nstages:\n  staging:\n    domain: staging.example.com\ndeploy:\n  command: []\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn rejects_non_http_placeholder_url() {
        let yaml = "project: site\nstages:\n  staging:\n    domain: staging.example.com\ndeploy:\n  command: [\"true\"]\nmaintenance:\n  placeholder_url: s3://bucket/index.html\n";
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("placeholder_url"));
    }

    #[test]
    fn unconfigured_stage_lookup_fails() {
        let config = Config::from_yaml(
            "project: site\nstages:\n  staging:\n    domain: staging.example.com\ndeploy:\n  command: [\"true\"]\n",
        )
        .unwrap();
        assert!(matches!(
            config.stage(Stage::Production),
            Err(Error::UnknownStage(Stage::Production))
        ));
    }
}

mod discovery {
    use super::*;

    #[test]
    fn discovers_config_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), Some("shop"), Some("shop.dev"), false).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.project.as_str(), "shop");
        assert!(config.all_domains().contains("www.shop.dev"));
    }

    #[test]
    fn discovers_config_in_state_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".stagecoach")).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME_DIR),
            "project: site\nstages:\n  development:\n    domain: dev.example.com\ndeploy:\n  command: [\"true\"]\n",
        )
        .unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert!(config.stages.contains_key(&Stage::Development));
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), None, None, false).unwrap();

        assert!(matches!(
            init_config(dir.path(), None, None, false),
            Err(Error::AlreadyExists(_))
        ));
        init_config(dir.path(), Some("other"), None, true).unwrap();
        assert_eq!(
            Config::discover(dir.path()).unwrap().project.as_str(),
            "other"
        );
    }
}
