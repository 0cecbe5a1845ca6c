// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Stage, project name, phantom-typed cloud IDs and domain helpers.

mod domain;
mod id;
mod project_name;
mod stage;

pub use domain::{domains_match, is_within_zone, normalize_domain};
pub use id::{CertificateArn, DistributionId, Id, InvalidationId, ZoneId};
pub use project_name::{ProjectName, ProjectNameError};
pub use stage::{ParseStageError, Stage};
