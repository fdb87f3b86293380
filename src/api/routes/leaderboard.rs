//! Cache-backed leaderboard endpoint.

use axum::extract::State;
use axum::Json;
use tracing::{debug, error};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::LeaderboardEntry;

/// Cache key for the assembled leaderboard.
pub const LEADERBOARD_CACHE_KEY: &str = "leaderboard";

/// `GET /api/leaderboard`: serve the assembled leaderboard, running the
/// fan-out only on cache miss.
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    if let Some(cached) = state.cache.get::<Vec<LeaderboardEntry>>(LEADERBOARD_CACHE_KEY) {
        debug!("Returning {} players from cache", cached.len());
        return Ok(Json(cached));
    }

    match state.assembler.assemble().await {
        Ok(entries) => {
            state.cache.set(
                LEADERBOARD_CACHE_KEY,
                &entries,
                state.leaderboard_ttl_minutes,
            );
            debug!("Returning {} players", entries.len());
            Ok(Json(entries))
        }
        Err(e) => {
            error!("Failed to get leaderboard: {}", e);
            Err(ApiError::BadGateway("Failed to fetch leaderboard".to_string()))
        }
    }
}
