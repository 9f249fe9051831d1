//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::UserPresenceDto;

/// Presence of one active room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPresenceDto {
    pub room_id: String,
    pub users: Vec<UserPresenceDto>,
    pub connections: usize,
}
