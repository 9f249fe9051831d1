//! Conversion logic between DTOs and domain entities.

use crate::domain::{ChatMessage, ConnectionIdentity, RoomPresence, UserPresence};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<UserPresence> for dto::UserPresenceDto {
    fn from(model: UserPresence) -> Self {
        Self {
            user_id: model.user_id.into_string(),
            username: model.username.into_string(),
            status: model.status.as_str().to_string(),
        }
    }
}

impl From<&ConnectionIdentity> for dto::PresenceChangePayload {
    fn from(identity: &ConnectionIdentity) -> Self {
        Self {
            user_id: identity.user_id.as_str().to_string(),
            username: identity.username.as_str().to_string(),
        }
    }
}

impl From<ChatMessage> for dto::ChatPayload {
    fn from(model: ChatMessage) -> Self {
        Self {
            room_id: model.room_id.into_string(),
            message_id: Some(model.message_id.into_string()),
            user_id: model.user_id.into_string(),
            username: model.username.into_string(),
            text: model.text,
            timestamp: Some(model.timestamp),
        }
    }
}

impl From<RoomPresence> for http::RoomPresenceDto {
    fn from(model: RoomPresence) -> Self {
        Self {
            room_id: model.room_id.into_string(),
            users: model.users.into_iter().map(Into::into).collect(),
            connections: model.connection_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, MessageId, RoomId, UserId, Username};
    use chrono::DateTime;

    #[test]
    fn test_user_presence_to_dto() {
        // テスト項目: UserPresence が DTO に変換される
        // given (前提条件):
        let presence = UserPresence::online(
            UserId::new("alice".to_string()).unwrap(),
            Username::new("Alice".to_string()).unwrap(),
        );

        // when (操作):
        let dto: dto::UserPresenceDto = presence.into();

        // then (期待する結果):
        assert_eq!(dto.user_id, "alice");
        assert_eq!(dto.username, "Alice");
        assert_eq!(dto.status, "online");
    }

    #[test]
    fn test_connection_identity_to_presence_change() {
        // テスト項目: 接続の識別情報から user_joined / user_left の payload が作られる
        // given (前提条件):
        let identity = ConnectionIdentity::new(
            ConnectionId::new("c1".to_string()).unwrap(),
            UserId::new("bob".to_string()).unwrap(),
            Username::new("Bob".to_string()).unwrap(),
            RoomId::new("r1".to_string()).unwrap(),
        );

        // when (操作):
        let payload = dto::PresenceChangePayload::from(&identity);

        // then (期待する結果):
        assert_eq!(payload.user_id, "bob");
        assert_eq!(payload.username, "Bob");
    }

    #[test]
    fn test_chat_message_to_payload_carries_server_fields() {
        // テスト項目: ChatMessage の messageId とサーバー時刻が payload に入る
        // given (前提条件):
        let timestamp = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let message = ChatMessage {
            room_id: RoomId::new("r1".to_string()).unwrap(),
            message_id: MessageId::new("m1".to_string()).unwrap(),
            user_id: UserId::new("alice".to_string()).unwrap(),
            username: Username::new("Alice".to_string()).unwrap(),
            text: "hi".to_string(),
            timestamp,
        };

        // when (操作):
        let payload: dto::ChatPayload = message.into();

        // then (期待する結果):
        assert_eq!(payload.room_id, "r1");
        assert_eq!(payload.message_id.as_deref(), Some("m1"));
        assert_eq!(payload.text, "hi");
        assert_eq!(payload.timestamp, Some(timestamp));
    }

    #[test]
    fn test_room_presence_to_dto() {
        // テスト項目: RoomPresence が HTTP DTO に変換される
        // given (前提条件):
        let presence = RoomPresence {
            room_id: RoomId::new("r1".to_string()).unwrap(),
            users: vec![UserPresence::online(
                UserId::new("alice".to_string()).unwrap(),
                Username::new("Alice".to_string()).unwrap(),
            )],
            connection_count: 2,
        };

        // when (操作):
        let dto: http::RoomPresenceDto = presence.into();

        // then (期待する結果):
        assert_eq!(dto.room_id, "r1");
        assert_eq!(dto.users.len(), 1);
        assert_eq!(dto.connections, 2);
    }
}
