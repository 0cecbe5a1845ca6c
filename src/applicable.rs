// ABOUTME: Tri-state outcome for optional pipeline steps.
// ABOUTME: Keeps "skipped because unconfigured" structurally distinct from failure.

use serde::Serialize;

/// Outcome of a step that may not apply to the current run.
///
/// Wrap in `Result` for steps that can also fail: `Result<Applicable<T>, E>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Applicable<T> {
    Applied(T),
    Skipped(String),
}

impl<T> Applicable<T> {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Applicable::Skipped(reason.into())
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Applicable::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Applicable::Applied(value) => Some(value),
            Applicable::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Applicable::Applied(_) => None,
            Applicable::Skipped(reason) => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Applicable<U> {
        match self {
            Applicable::Applied(value) => Applicable::Applied(f(value)),
            Applicable::Skipped(reason) => Applicable::Skipped(reason),
        }
    }
}
