//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    infrastructure::dto::http::RoomPresenceDto,
    ui::state::AppState,
    usecase::GetRoomPresenceError,
};

/// Liveness probe (plain text)
pub async fn health() -> &'static str {
    "OK"
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get presence of every active room
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomPresenceDto>>, StatusCode> {
    match state.get_rooms_usecase.execute().await {
        // Domain Model から DTO への変換
        Ok(rooms) => Ok(Json(rooms.into_iter().map(Into::into).collect())),
        Err(e) => {
            tracing::error!("Failed to get rooms: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Get presence of one room
pub async fn get_room_presence(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomPresenceDto>, StatusCode> {
    match state.get_room_presence_usecase.execute(room_id).await {
        Ok(presence) => Ok(Json(presence.into())),
        Err(GetRoomPresenceError::InvalidRoomId(_)) => Err(StatusCode::BAD_REQUEST),
        Err(GetRoomPresenceError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(GetRoomPresenceError::Registry(e)) => {
            tracing::error!("Failed to get room presence: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
