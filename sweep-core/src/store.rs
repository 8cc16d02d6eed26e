use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

use crate::model::Snapshot;

/// The on-disk home of the latest snapshot, stored as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored snapshot. The file is written next to the target
    /// and renamed into place, so readers see either the old or the new one.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create snapshot directory: {}", parent.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write snapshot file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move snapshot into place: {}", self.path.display()))?;

        Ok(())
    }

    /// The stored snapshot, or `None` if nothing has been saved yet.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read snapshot file: {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot file: {}", self.path.display()))?;

        Ok(Some(snapshot))
    }

    /// True when there is no readable snapshot or it is older than `max_age`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.load() {
            Ok(Some(snapshot)) => now - snapshot.last_updated() > max_age,
            _ => true,
        }
    }
}
