//! Cleanup scheduler.
//!
//! Recurring background task that evicts expired records independently of
//! request traffic. Runs one pass immediately at startup, then on a fixed
//! interval. A failed pass is logged and the schedule continues.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::parse_duration;

/// Fallback schedule: every 6 hours.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(6 * 3600);

/// The cleanup work invoked on each pass; returns how many records were
/// removed.
pub type CleanupFn = Arc<dyn Fn() -> anyhow::Result<usize> + Send + Sync>;

/// Parse a configured interval expression ("6h", "30m", "90s"). Invalid or
/// zero expressions fall back to [`DEFAULT_CLEANUP_INTERVAL`] rather than
/// refusing to start.
pub fn resolve_interval(expr: &str) -> Duration {
    match parse_duration(expr) {
        Some(duration) if !duration.is_zero() => duration,
        _ => {
            error!(
                "Invalid cleanup interval {:?}, falling back to {:?}",
                expr, DEFAULT_CLEANUP_INTERVAL
            );
            DEFAULT_CLEANUP_INTERVAL
        }
    }
}

/// Periodically invokes a cleanup callback.
///
/// `start()` and `stop()` are idempotent; repeated initialization in a
/// long-lived process can never accumulate duplicate timers.
pub struct CleanupScheduler {
    interval: Duration,
    callback: CleanupFn,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CleanupScheduler {
    pub fn new(interval: Duration, callback: CleanupFn) -> Self {
        Self {
            interval,
            callback,
            task: Mutex::new(None),
        }
    }

    /// Start the schedule: one immediate pass, then one per interval.
    /// Returns `false` (with a warning) when already running.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut task = self.task.lock().expect("scheduler mutex poisoned");
        if task.is_some() {
            warn!("Scheduler already running");
            return false;
        }

        info!("Starting cleanup scheduler (interval {:?})", self.interval);

        let scheduler = Arc::clone(self);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.interval);
            loop {
                // First tick fires immediately: the cold-start pass.
                ticker.tick().await;
                scheduler.run_once();
            }
        }));

        true
    }

    /// Cancel the schedule. Safe to call repeatedly or when not running.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().expect("scheduler mutex poisoned").take() {
            task.abort();
            info!("Cleanup scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .expect("scheduler mutex poisoned")
            .is_some()
    }

    /// Run one cleanup pass, absorbing callback failures.
    fn run_once(&self) {
        debug!("Running scheduled cleanup...");
        match (self.callback)() {
            Ok(removed) if removed > 0 => info!("Scheduled cleanup removed {} records", removed),
            Ok(_) => debug!("Scheduled cleanup found nothing to remove"),
            Err(e) => error!("Error during scheduled cleanup: {}", e),
        }
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().expect("scheduler mutex poisoned").take() {
            task.abort();
        }
    }
}
