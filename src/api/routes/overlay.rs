//! Overlay CRUD endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::store::OverlayRecord;

/// Request body for create/update.
#[derive(Debug, Deserialize)]
pub struct OverlayPayload {
    /// Opaque overlay configuration.
    pub data: serde_json::Value,

    /// Lifetime override; the configured default applies when absent.
    pub expiration_hours: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

/// `POST /api/overlay`
pub async fn create_overlay(
    State(state): State<AppState>,
    Json(payload): Json<OverlayPayload>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let hours = payload
        .expiration_hours
        .unwrap_or(state.overlay_expiration_hours);

    match state.store.create(payload.data, hours) {
        Ok(id) => Ok(Json(CreatedResponse { id })),
        Err(e) => {
            error!("Error creating overlay: {}", e);
            Err(ApiError::Internal("Failed to create overlay".to_string()))
        }
    }
}

/// `GET /api/overlay/:id`
pub async fn get_overlay(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OverlayRecord>, ApiError> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Overlay {} not found", id)))
}

/// `PUT /api/overlay/:id`
pub async fn update_overlay(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OverlayPayload>,
) -> Result<Json<OverlayRecord>, ApiError> {
    let hours = payload
        .expiration_hours
        .unwrap_or(state.overlay_expiration_hours);

    if !state.store.update(&id, payload.data, hours) {
        return Err(ApiError::NotFound(format!("Overlay {} not found", id)));
    }

    state
        .store
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::Internal("Overlay vanished after update".to_string()))
}

/// `DELETE /api/overlay/:id`
pub async fn delete_overlay(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ApiError> {
    if !state.store.delete(&id) {
        return Err(ApiError::NotFound(format!("Overlay {} not found", id)));
    }
    Ok(Json(DeletedResponse { success: true }))
}
