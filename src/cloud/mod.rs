// ABOUTME: Cloud provider access: typed snapshots, capability traits, and the aws CLI adapter.
// ABOUTME: Everything here is an external collaborator of the deployment core.

pub mod aws;
mod error;
mod ops;
mod types;

pub use error::{CloudError, CloudErrorKind};
pub use ops::{
    CertificateOps, DistributionOps, DnsOps, IdentityOps, MaintenanceOps, distributions_serving,
    find_zone_for,
};
pub use types::{Certificate, Distribution, DnsRecord, HostedZone, PriorConfig};
