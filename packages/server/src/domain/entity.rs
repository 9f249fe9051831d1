//! Domain entities.

use chrono::{DateTime, Utc};

use super::value_object::{ConnectionId, MessageId, RoomId, UserId, Username};

/// Identity of one live connection: who is connected, to which room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionIdentity {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub username: Username,
    pub room_id: RoomId,
}

impl ConnectionIdentity {
    pub fn new(
        connection_id: ConnectionId,
        user_id: UserId,
        username: Username,
        room_id: RoomId,
    ) -> Self {
        Self {
            connection_id,
            user_id,
            username,
            room_id,
        }
    }
}

/// Presence status of a user in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    Online,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
        }
    }
}

/// One entry of a room's user list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPresence {
    pub user_id: UserId,
    pub username: Username,
    pub status: PresenceStatus,
}

impl UserPresence {
    pub fn online(user_id: UserId, username: Username) -> Self {
        Self {
            user_id,
            username,
            status: PresenceStatus::Online,
        }
    }
}

/// Snapshot of who is present in a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPresence {
    pub room_id: RoomId,
    /// Present users, each user once, ordered by user id
    pub users: Vec<UserPresence>,
    /// Number of open connections (a user may hold several)
    pub connection_count: usize,
}

/// A chat message as accepted by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub username: Username,
    pub text: String,
    /// Server clock time at which the message was accepted
    pub timestamp: DateTime<Utc>,
}

/// Latest code of a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnapshot {
    pub room_id: RoomId,
    pub code: String,
    pub language: String,
    pub updated_at: DateTime<Utc>,
}
