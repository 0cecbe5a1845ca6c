// ABOUTME: Hosted zone tracking and the stale-zone heuristic.
// ABOUTME: Zone age is only known for zones created through this tool.

mod stale;
mod tracker;

pub use stale::{
    StaleZone, ZoneCleanupResult, collect_tracked_records, create_tracked_zone,
    delete_stale_zones, find_stale_zones,
};
pub use tracker::{ZONES_FILENAME, ZoneTracker, ZoneTrackingRecord};

use std::path::PathBuf;

use crate::cloud::CloudError;
use crate::types::ZoneId;

#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    #[error("failed to access zone tracker {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zone tracker {path} is corrupted: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize zone tracker: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("hosted zone {domain} already exists ({zone_id})")]
    AlreadyExists { domain: String, zone_id: ZoneId },

    #[error("zone {domain} is not tracked")]
    NotTracked { domain: String },

    #[error(transparent)]
    Cloud(#[from] CloudError),
}
