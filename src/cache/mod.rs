//! In-process TTL cache for assembled payloads.
//!
//! Keyed JSON store used to avoid re-running the expensive leaderboard
//! fan-out on every request. Entries expire after a per-entry TTL; stale
//! entries are evicted opportunistically on read and by a background sweep
//! that bounds memory growth from keys that are written but never read
//! again. Purely a performance optimization: contents are lost on restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

/// A stored payload with its absolute expiry.
struct CacheEntry {
    payload: serde_json::Value,
    expires_at: Instant,
}

/// Process-wide keyed TTL store.
///
/// Constructed once by the process entry point and injected into consumers;
/// call [`ResultCache::start_sweep`] after construction and
/// [`ResultCache::shutdown`] on process teardown.
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    sweep_interval: Duration,
    sweep_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl ResultCache {
    pub fn new(sweep_interval: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            sweep_interval,
            sweep_task: Mutex::new(None),
        }
    }

    /// Store a value with expiry `now + ttl_minutes`.
    ///
    /// Serialization failures are logged and the entry is skipped; callers
    /// treat the cache as best-effort.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl_minutes: u64) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };

        let expires_at = Instant::now() + Duration::from_secs(ttl_minutes * 60);
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                expires_at,
            },
        );
    }

    /// Fetch a value while it is unexpired. Expired entries are evicted on
    /// the spot.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");

        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => Instant::now() >= entry.expires_at,
        };
        if expired {
            entries.remove(key);
            return None;
        }

        let payload = entries.get(key).map(|entry| entry.payload.clone())?;

        match serde_json::from_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to deserialize cache entry {}: {}", key, e);
                entries.remove(key);
                None
            }
        }
    }

    /// Evict every expired entry; returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().expect("cache mutex poisoned").clear();
    }

    /// Number of live (possibly stale-but-unswept) entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the background sweep task. Idempotent: a second call warns and
    /// leaves the existing task running. Returns whether a task was started.
    pub fn start_sweep(self: &Arc<Self>) -> bool {
        let mut task = self.sweep_task.lock().expect("cache mutex poisoned");
        if task.is_some() {
            warn!("Cache sweep already running");
            return false;
        }

        let cache = Arc::clone(self);
        let interval = self.sweep_interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would sweep an empty cache.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let cleaned = cache.cleanup();
                if cleaned > 0 {
                    info!("Cleaned {} expired cache entries", cleaned);
                } else {
                    debug!("Cache sweep found nothing to evict");
                }
            }
        }));

        true
    }

    /// Stop the sweep and drop all entries. Safe to call repeatedly and
    /// when the sweep was never started.
    pub fn shutdown(&self) {
        if let Some(task) = self.sweep_task.lock().expect("cache mutex poisoned").take() {
            task.abort();
        }
        self.clear();
    }
}

impl Drop for ResultCache {
    fn drop(&mut self) {
        if let Some(task) = self.sweep_task.lock().expect("cache mutex poisoned").take() {
            task.abort();
        }
    }
}
