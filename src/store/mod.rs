//! Overlay persistence.
//!
//! User-created overlay configs are short-lived keyed records with a TTL.
//! They are persisted as one JSONL file under the data directory; each line
//! is one overlay record. Reads filter out expired records, and the cleanup
//! scheduler prunes them from disk. All lookup/mutation errors are caught
//! and mapped to safe defaults; only `create` propagates.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Errors that can occur during overlay storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One persisted overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayRecord {
    pub id: Uuid,

    /// Opaque overlay configuration as submitted by the client.
    pub data: serde_json::Value,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Records stop being served once this passes; the scheduler removes
    /// them from disk.
    pub expires_at: DateTime<Utc>,
}

impl OverlayRecord {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Store statistics for the health and admin endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreStats {
    pub active: usize,
}

/// JSONL-backed overlay store.
pub struct OverlayStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl OverlayStore {
    /// Create a store rooted at `data_dir`. Nothing is touched on disk until
    /// the first write.
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join("overlays.jsonl"),
            lock: Mutex::new(()),
        }
    }

    /// Create a new overlay; returns its id. The only store operation that
    /// propagates errors.
    pub fn create(
        &self,
        data: serde_json::Value,
        expiration_hours: i64,
    ) -> Result<Uuid, StoreError> {
        let _guard = self.lock.lock().expect("store mutex poisoned");

        let now = Utc::now();
        let record = OverlayRecord {
            id: Uuid::new_v4(),
            data,
            created_at: now,
            updated_at: now,
            expires_at: now + chrono::Duration::hours(expiration_hours),
        };

        let mut records = self.read_records()?;
        records.push(record.clone());
        self.write_records(&records)?;

        debug!("Created overlay with ID: {}", record.id);
        Ok(record.id)
    }

    /// Fetch an overlay, only while unexpired.
    pub fn get(&self, id: &Uuid) -> Option<OverlayRecord> {
        let _guard = self.lock.lock().expect("store mutex poisoned");

        let records = match self.read_records() {
            Ok(records) => records,
            Err(e) => {
                error!("Error getting overlay: {}", e);
                return None;
            }
        };

        let now = Utc::now();
        records
            .into_iter()
            .find(|r| r.id == *id && r.is_live(now))
    }

    /// Replace an unexpired overlay's data and refresh its expiry. Returns
    /// whether a record was updated.
    pub fn update(&self, id: &Uuid, data: serde_json::Value, expiration_hours: i64) -> bool {
        let _guard = self.lock.lock().expect("store mutex poisoned");

        let mut records = match self.read_records() {
            Ok(records) => records,
            Err(e) => {
                error!("Error updating overlay: {}", e);
                return false;
            }
        };

        let now = Utc::now();
        let Some(record) = records
            .iter_mut()
            .find(|r| r.id == *id && r.is_live(now))
        else {
            return false;
        };

        record.data = data;
        record.updated_at = now;
        record.expires_at = now + chrono::Duration::hours(expiration_hours);

        match self.write_records(&records) {
            Ok(()) => {
                debug!("Updated overlay with ID: {}", id);
                true
            }
            Err(e) => {
                error!("Error updating overlay: {}", e);
                false
            }
        }
    }

    /// Delete an overlay regardless of expiry. Returns whether a record was
    /// removed.
    pub fn delete(&self, id: &Uuid) -> bool {
        let _guard = self.lock.lock().expect("store mutex poisoned");

        let mut records = match self.read_records() {
            Ok(records) => records,
            Err(e) => {
                error!("Error deleting overlay: {}", e);
                return false;
            }
        };

        let before = records.len();
        records.retain(|r| r.id != *id);
        if records.len() == before {
            return false;
        }

        match self.write_records(&records) {
            Ok(()) => {
                debug!("Deleted overlay with ID: {}", id);
                true
            }
            Err(e) => {
                error!("Error deleting overlay: {}", e);
                false
            }
        }
    }

    /// Remove expired records from disk; returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let _guard = self.lock.lock().expect("store mutex poisoned");

        let mut records = match self.read_records() {
            Ok(records) => records,
            Err(e) => {
                error!("Error during cleanup: {}", e);
                return 0;
            }
        };

        let now = Utc::now();
        let before = records.len();
        records.retain(|r| r.is_live(now));
        let removed = before - records.len();

        if removed == 0 {
            return 0;
        }

        match self.write_records(&records) {
            Ok(()) => {
                info!("Cleaned up {} expired overlays", removed);
                removed
            }
            Err(e) => {
                error!("Error during cleanup: {}", e);
                0
            }
        }
    }

    /// Count of unexpired records, propagating storage failures. The health
    /// endpoint uses this to distinguish "empty" from "broken".
    pub fn try_stats(&self) -> Result<StoreStats, StoreError> {
        let _guard = self.lock.lock().expect("store mutex poisoned");

        let records = self.read_records()?;
        let now = Utc::now();
        Ok(StoreStats {
            active: records.iter().filter(|r| r.is_live(now)).count(),
        })
    }

    /// Count of unexpired records; storage failures log and count as zero.
    pub fn stats(&self) -> StoreStats {
        match self.try_stats() {
            Ok(stats) => stats,
            Err(e) => {
                error!("Error getting stats: {}", e);
                StoreStats { active: 0 }
            }
        }
    }

    /// Read every record; a missing file is an empty store, an unreadable
    /// line is skipped with a warning.
    fn read_records(&self) -> Result<Vec<OverlayRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "Skipping malformed overlay record at {:?}:{}: {}",
                    self.path,
                    line_no + 1,
                    e
                ),
            }
        }

        Ok(records)
    }

    /// Replace the entire file.
    fn write_records(&self, records: &[OverlayRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        for record in records {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
        }
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> OverlayStore {
        OverlayStore::new(dir.path().to_path_buf())
    }

    #[test]
    fn test_create_and_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let id = store.create(json!({"team": "blue"}), 2).unwrap();
        let record = store.get(&id).unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.data, json!({"team": "blue"}));
    }

    #[test]
    fn test_get_missing_overlay() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_expired_overlay_is_invisible() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let id = store.create(json!({"x": 1}), 0).unwrap();
        assert!(store.get(&id).is_none());
        assert_eq!(store.stats().active, 0);
    }

    #[test]
    fn test_update_refreshes_data() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let id = store.create(json!({"v": 1}), 2).unwrap();
        assert!(store.update(&id, json!({"v": 2}), 2));

        let record = store.get(&id).unwrap();
        assert_eq!(record.data, json!({"v": 2}));
        assert!(record.updated_at >= record.created_at);
    }

    #[test]
    fn test_update_expired_overlay_fails() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let id = store.create(json!({"v": 1}), 0).unwrap();
        assert!(!store.update(&id, json!({"v": 2}), 2));
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let id = store.create(json!({}), 2).unwrap();
        assert!(store.delete(&id));
        assert!(!store.delete(&id));
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_cleanup_removes_only_expired() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let live = store.create(json!({"keep": true}), 2).unwrap();
        store.create(json!({}), 0).unwrap();
        store.create(json!({}), 0).unwrap();

        assert_eq!(store.cleanup_expired(), 2);
        assert_eq!(store.cleanup_expired(), 0);
        assert!(store.get(&live).is_some());
        assert_eq!(store.stats().active, 1);
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let id = test_store(&dir).create(json!({"persisted": true}), 2).unwrap();

        let reopened = test_store(&dir);
        let record = reopened.get(&id).unwrap();
        assert_eq!(record.data, json!({"persisted": true}));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let id = store.create(json!({"ok": true}), 2).unwrap();

        // Corrupt the file with a garbage line.
        let path = dir.path().join("overlays.jsonl");
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("not json\n");
        std::fs::write(&path, content).unwrap();

        assert!(store.get(&id).is_some());
        assert_eq!(store.stats().active, 1);
    }

    #[test]
    fn test_stats_on_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        assert_eq!(store.stats().active, 0);
    }
}
