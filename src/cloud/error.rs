// ABOUTME: Cloud adapter error types with the SNAFU pattern.
// ABOUTME: Exposes an error kind for callers that degrade instead of failing.

use snafu::Snafu;

use crate::executor::CommandError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CloudError {
    #[snafu(display("{operation} failed: {message}"))]
    Api { operation: String, message: String },

    #[snafu(display("could not run {operation}: {source}"))]
    Command {
        operation: String,
        source: CommandError,
    },

    #[snafu(display("unexpected {operation} response: {source}"))]
    Parse {
        operation: String,
        source: serde_json::Error,
    },

    #[snafu(display("{resource} not found"))]
    NotFound { resource: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudErrorKind {
    /// The provider rejected or failed the call.
    Api,
    /// The client could not be reached or run.
    Unavailable,
    /// The response did not have the expected shape.
    InvalidResponse,
    NotFound,
}

impl CloudError {
    pub fn kind(&self) -> CloudErrorKind {
        match self {
            CloudError::Api { .. } => CloudErrorKind::Api,
            CloudError::Command { .. } => CloudErrorKind::Unavailable,
            CloudError::Parse { .. } => CloudErrorKind::InvalidResponse,
            CloudError::NotFound { .. } => CloudErrorKind::NotFound,
        }
    }

    pub fn api(operation: impl Into<String>, message: impl Into<String>) -> Self {
        CloudError::Api {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
