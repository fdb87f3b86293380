//! Health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub active_overlays: Option<usize>,
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.try_stats() {
        Ok(stats) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                timestamp: Utc::now(),
                active_overlays: Some(stats.active),
            }),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    timestamp: Utc::now(),
                    active_overlays: None,
                }),
            )
        }
    }
}
