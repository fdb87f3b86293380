//! Manual cleanup trigger.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::api::state::AppState;
use crate::store::StoreStats;

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub success: bool,

    /// Expired overlay records removed from the store.
    pub cleaned_count: usize,

    /// Expired entries evicted from the result cache.
    pub cache_cleaned: usize,

    pub stats: StoreStats,

    pub timestamp: DateTime<Utc>,
}

/// `POST /api/admin/cleanup`: run the same work the scheduler does, on
/// demand.
pub async fn run_cleanup(State(state): State<AppState>) -> Json<CleanupResponse> {
    let cleaned_count = state.store.cleanup_expired();
    let cache_cleaned = state.cache.cleanup();
    let stats = state.store.stats();

    info!(
        "Manual cleanup: removed {} expired overlays, {} cache entries",
        cleaned_count, cache_cleaned
    );

    Json(CleanupResponse {
        success: true,
        cleaned_count,
        cache_cleaned,
        stats,
        timestamp: Utc::now(),
    })
}
