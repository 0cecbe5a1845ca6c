// ABOUTME: Local record of which DNS zones this tool created and when.
// ABOUTME: Persisted as a JSON map from domain to zone record under the state directory.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::ZoneError;
use crate::config::Config;
use crate::types::{ZoneId, normalize_domain};

pub const ZONES_FILENAME: &str = "zones.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneTrackingRecord {
    pub domain: String,
    pub zone_id: ZoneId,
    pub created_at: DateTime<Utc>,
    pub project_name: String,
}

#[derive(Debug)]
pub struct ZoneTracker {
    path: PathBuf,
    records: BTreeMap<String, ZoneTrackingRecord>,
}

impl ZoneTracker {
    /// Load the tracker at `path`. A missing file is an empty tracker.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ZoneError> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| ZoneError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(ZoneError::Io { path, source }),
        };
        Ok(Self { path, records })
    }

    pub fn for_project_root(root: &Path) -> Result<Self, ZoneError> {
        Self::load(Config::state_dir(root).join(ZONES_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(
        &mut self,
        domain: &str,
        zone_id: ZoneId,
        project_name: &str,
        now: DateTime<Utc>,
    ) -> Result<&ZoneTrackingRecord, ZoneError> {
        let domain = normalize_domain(domain);
        let record = ZoneTrackingRecord {
            domain: domain.clone(),
            zone_id,
            created_at: now,
            project_name: project_name.to_string(),
        };
        self.records.insert(domain.clone(), record);
        self.save()?;
        self.records
            .get(&domain)
            .ok_or(ZoneError::NotTracked { domain })
    }

    pub fn get(&self, domain: &str) -> Option<&ZoneTrackingRecord> {
        self.records.get(&normalize_domain(domain))
    }

    /// Stop tracking `domain`. Returns the removed record.
    pub fn remove(&mut self, domain: &str) -> Result<Option<ZoneTrackingRecord>, ZoneError> {
        let removed = self.records.remove(&normalize_domain(domain));
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn records(&self) -> impl Iterator<Item = &ZoneTrackingRecord> {
        self.records.values()
    }

    /// Time since the zone was created, if tracked.
    pub fn age(&self, domain: &str, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.get(domain).map(|record| now - record.created_at)
    }

    /// Tracked and younger than `min_age`. Untracked zones are never too young.
    pub fn is_too_young(&self, domain: &str, min_age: TimeDelta, now: DateTime<Utc>) -> bool {
        self.age(domain, now).is_some_and(|age| age < min_age)
    }

    fn save(&self) -> Result<(), ZoneError> {
        let io = |source| ZoneError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let json = serde_json::to_string_pretty(&self.records).map_err(ZoneError::Serialize)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io)?;
        std::fs::rename(&tmp, &self.path).map_err(io)
    }
}
