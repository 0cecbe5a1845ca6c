// ABOUTME: Confirmed deletion of distributions the analyzer marks deletable.
// ABOUTME: Disables, waits for propagation, then deletes; one failure never aborts the loop.

use serde::Serialize;

use super::analyzer::DistributionAnalysis;
use crate::cloud::DistributionOps;
use crate::confirm::Confirm;
use crate::types::DistributionId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupResult {
    pub deleted: Vec<DistributionId>,
    /// Not eligible or declined, with the reason.
    pub skipped: Vec<(DistributionId, String)>,
    pub failed: Vec<(DistributionId, String)>,
}

impl CleanupResult {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Delete every analysis with `can_delete` that the operator confirms.
pub async fn cleanup_distributions(
    cdn: &dyn DistributionOps,
    analyses: &[DistributionAnalysis],
    confirm: &dyn Confirm,
) -> CleanupResult {
    let mut result = CleanupResult::default();

    for analysis in analyses {
        if !analysis.can_delete() {
            result
                .skipped
                .push((analysis.id.clone(), "not eligible for deletion".to_string()));
            continue;
        }

        let message = format!(
            "Delete distribution {} ({}, {})?",
            analysis.id,
            analysis.domain,
            analysis.reasons.join("; ")
        );
        if !confirm.confirm(&message) {
            result
                .skipped
                .push((analysis.id.clone(), "declined".to_string()));
            continue;
        }

        if let Err(e) = cdn.disable_distribution(&analysis.id).await {
            tracing::warn!("failed to disable {}: {e}", analysis.id);
            result.failed.push((analysis.id.clone(), e.to_string()));
            continue;
        }

        // Deletion is rejected until the disable has propagated.
        if let Err(e) = cdn.wait_until_deployed(&analysis.id).await {
            tracing::warn!("{} did not finish disabling: {e}", analysis.id);
            result.failed.push((analysis.id.clone(), e.to_string()));
            continue;
        }

        match cdn.delete_distribution(&analysis.id).await {
            Ok(()) => {
                tracing::info!("deleted distribution {}", analysis.id);
                result.deleted.push(analysis.id.clone());
            }
            Err(e) => {
                tracing::warn!("failed to delete {}: {e}", analysis.id);
                result.failed.push((analysis.id.clone(), e.to_string()));
            }
        }
    }

    result
}
