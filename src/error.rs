// ABOUTME: Application-wide error types for stagecoach.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::cloud::CloudError;
use crate::deploy::DeployError;
use crate::lock::LockError;
use crate::types::Stage;
use crate::zones::ZoneError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("stage {0} is not configured")]
    UnknownStage(Stage),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// A command finished but some of its work failed. Details were already printed.
    #[error("{0}")]
    Incomplete(String),
}

pub type Result<T> = std::result::Result<T, Error>;
