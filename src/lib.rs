//! # Rift Overlay
//!
//! Stream overlay backend with ranked leaderboard aggregation.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (accounts, rosters, rank snapshots, entries)
//! - **extract**: Rank extraction strategies for scraped profile HTML
//! - **fetch**: Bounded profile-page fetching with failure isolation
//! - **leaderboard**: Assembly pipeline (upstream listing, dedup, override, enrichment)
//! - **cache**: Process-wide TTL cache with background sweep
//! - **scheduler**: Recurring cleanup of expired records
//! - **store**: Persisted overlay configs (keyed TTL records)
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod cache;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod leaderboard;
pub mod models;
pub mod scheduler;
pub mod store;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num * multiplier))
}
