// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a lock release warning.
    pub fn lock_release(message: impl Into<String>) -> Self {
        Self::new(WarningKind::LockRelease, message)
    }

    pub fn maintenance_restore(message: impl Into<String>) -> Self {
        Self::new(WarningKind::MaintenanceRestore, message)
    }

    pub fn maintenance_skipped(message: impl Into<String>) -> Self {
        Self::new(WarningKind::MaintenanceSkipped, message)
    }

    pub fn cache_invalidation(message: impl Into<String>) -> Self {
        Self::new(WarningKind::CacheInvalidation, message)
    }

    /// Drift or orphan found by the post-deploy audit.
    pub fn reconciliation(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Reconciliation, message)
    }

    /// The audit itself could not run.
    pub fn audit(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Audit, message)
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Failed to release deploy lock (lock file may remain).
    LockRelease,
    /// Failed to restore routing after a maintenance window.
    MaintenanceRestore,
    /// Maintenance was requested but no distribution serves the stage yet.
    MaintenanceSkipped,
    CacheInvalidation,
    Reconciliation,
    Audit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::lock_release("failed to remove lock file"));
        diag.warn(Warning::reconciliation("E123 orphaned"));
        diag.warn(Warning::reconciliation("E456 misconfigured"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 3);
        assert_eq!(diag.of_kind(WarningKind::Reconciliation).count(), 2);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(Warning::lock_release("x").kind, WarningKind::LockRelease);
        assert_eq!(
            Warning::maintenance_restore("x").kind,
            WarningKind::MaintenanceRestore
        );
        assert_eq!(
            Warning::cache_invalidation("x").kind,
            WarningKind::CacheInvalidation
        );
        assert_eq!(Warning::audit("x").kind, WarningKind::Audit);
    }
}
