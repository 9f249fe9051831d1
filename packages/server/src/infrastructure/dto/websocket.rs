//! WebSocket message DTOs.
//!
//! Every frame is a JSON object `{"type": <string>, "payload": <object>}`.
//! `Envelope` is the tagged union over the six message kinds; payload field
//! names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Message type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    CodeChange,
    Chat,
    Cursor,
    UserJoined,
    UserLeft,
    UserList,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::CodeChange => "code_change",
            MessageType::Chat => "chat",
            MessageType::Cursor => "cursor",
            MessageType::UserJoined => "user_joined",
            MessageType::UserLeft => "user_left",
            MessageType::UserList => "user_list",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "code_change" => Some(MessageType::CodeChange),
            "chat" => Some(MessageType::Chat),
            "cursor" => Some(MessageType::Cursor),
            "user_joined" => Some(MessageType::UserJoined),
            "user_left" => Some(MessageType::UserLeft),
            "user_list" => Some(MessageType::UserList),
            _ => None,
        }
    }

    /// Types only the server may emit
    pub fn is_server_only(&self) -> bool {
        matches!(
            self,
            MessageType::UserJoined | MessageType::UserLeft | MessageType::UserList
        )
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode a payload field, falling back to its default when the value is
/// `null` or of the wrong type
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Payload of `code_change`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeChangePayload {
    #[serde(deserialize_with = "lenient")]
    pub room_id: String,
    #[serde(deserialize_with = "lenient")]
    pub user_id: String,
    #[serde(deserialize_with = "lenient")]
    pub username: String,
    #[serde(deserialize_with = "lenient")]
    pub code: String,
    #[serde(deserialize_with = "lenient")]
    pub language: String,
    /// Editor delta, forwarded untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<serde_json::Value>,
}

/// Payload of `chat`.
///
/// Clients send `roomId, userId, username, text, timestamp`; the server
/// always answers with its own `messageId` and `timestamp`. A client
/// timestamp that is not RFC 3339 reads as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatPayload {
    #[serde(deserialize_with = "lenient")]
    pub room_id: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub message_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub user_id: String,
    #[serde(deserialize_with = "lenient")]
    pub username: String,
    #[serde(deserialize_with = "lenient")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Cursor position in the editor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CursorPosition {
    #[serde(deserialize_with = "lenient")]
    pub line_number: u32,
    #[serde(deserialize_with = "lenient")]
    pub column: u32,
}

/// Payload of `cursor`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CursorPayload {
    #[serde(deserialize_with = "lenient")]
    pub room_id: String,
    #[serde(deserialize_with = "lenient")]
    pub user_id: String,
    #[serde(deserialize_with = "lenient")]
    pub username: String,
    #[serde(deserialize_with = "lenient")]
    pub position: CursorPosition,
}

/// Payload of `user_joined` / `user_left`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresenceChangePayload {
    pub user_id: String,
    pub username: String,
}

/// One entry of `user_list`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPresenceDto {
    pub user_id: String,
    pub username: String,
    pub status: String,
}

/// A WebSocket message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Envelope {
    CodeChange(CodeChangePayload),
    Chat(ChatPayload),
    Cursor(CursorPayload),
    UserJoined(PresenceChangePayload),
    UserLeft(PresenceChangePayload),
    UserList(Vec<UserPresenceDto>),
}

impl Envelope {
    pub fn message_type(&self) -> MessageType {
        match self {
            Envelope::CodeChange(_) => MessageType::CodeChange,
            Envelope::Chat(_) => MessageType::Chat,
            Envelope::Cursor(_) => MessageType::Cursor,
            Envelope::UserJoined(_) => MessageType::UserJoined,
            Envelope::UserLeft(_) => MessageType::UserLeft,
            Envelope::UserList(_) => MessageType::UserList,
        }
    }
}

/// Errors raised while decoding an inbound frame
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not a JSON object with a string `type`
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    /// `type` is not one of the known message types
    #[error("unknown message type '{0}'")]
    UnknownType(String),

    /// `payload` does not match the shape of its type
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: MessageType,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct RawEnvelope {
    r#type: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Decode a text frame into an `Envelope`.
///
/// Unknown fields are ignored and missing, `null` or mistyped payload fields
/// take their default, mirroring what browsers actually send.
pub fn decode_envelope(text: &str) -> Result<Envelope, DecodeError> {
    let raw: RawEnvelope = serde_json::from_str(text).map_err(DecodeError::Malformed)?;
    let kind = MessageType::parse(&raw.r#type).ok_or(DecodeError::UnknownType(raw.r#type))?;
    let invalid = |source| DecodeError::InvalidPayload { kind, source };
    // `{"type": "chat"}` without a payload decodes like an empty object
    let payload = match raw.payload {
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        payload => payload,
    };

    let envelope = match kind {
        MessageType::CodeChange => {
            Envelope::CodeChange(serde_json::from_value(payload).map_err(invalid)?)
        }
        MessageType::Chat => Envelope::Chat(serde_json::from_value(payload).map_err(invalid)?),
        MessageType::Cursor => Envelope::Cursor(serde_json::from_value(payload).map_err(invalid)?),
        MessageType::UserJoined => {
            Envelope::UserJoined(serde_json::from_value(payload).map_err(invalid)?)
        }
        MessageType::UserLeft => {
            Envelope::UserLeft(serde_json::from_value(payload).map_err(invalid)?)
        }
        MessageType::UserList => {
            Envelope::UserList(serde_json::from_value(payload).map_err(invalid)?)
        }
    };

    Ok(envelope)
}

/// Encode an `Envelope` into a text frame
pub fn encode_envelope(envelope: &Envelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_code_change() {
        // テスト項目: code_change メッセージをデコードできる
        // given (前提条件):
        let text = json!({
            "type": "code_change",
            "payload": {
                "roomId": "r1",
                "userId": "alice",
                "username": "Alice",
                "code": "x",
                "language": "js",
                "changes": [{"range": [0, 1]}]
            }
        })
        .to_string();

        // when (操作):
        let envelope = decode_envelope(&text).unwrap();

        // then (期待する結果):
        let Envelope::CodeChange(payload) = envelope else {
            panic!("expected code_change");
        };
        assert_eq!(payload.code, "x");
        assert_eq!(payload.language, "js");
        assert!(payload.changes.is_some());
    }

    #[test]
    fn test_decode_chat_with_missing_fields_uses_defaults() {
        // テスト項目: 欠けているフィールドはデフォルト値になる
        // given (前提条件):
        let text = r#"{"type":"chat","payload":{"text":"hi"}}"#;

        // when (操作):
        let envelope = decode_envelope(text).unwrap();

        // then (期待する結果):
        let Envelope::Chat(payload) = envelope else {
            panic!("expected chat");
        };
        assert_eq!(payload.text, "hi");
        assert_eq!(payload.user_id, "");
        assert_eq!(payload.timestamp, None);
    }

    #[test]
    fn test_decode_chat_with_client_timestamp() {
        // テスト項目: クライアントの ISO 8601 タイムスタンプを読み取れる
        // given (前提条件):
        let text = r#"{"type":"chat","payload":{"text":"hi","timestamp":"2024-05-01T10:00:00.000Z"}}"#;

        // when (操作):
        let envelope = decode_envelope(text).unwrap();

        // then (期待する結果):
        let Envelope::Chat(payload) = envelope else {
            panic!("expected chat");
        };
        assert_eq!(
            payload.timestamp.map(|t| t.timestamp()),
            Some(1_714_557_600)
        );
    }

    #[test]
    fn test_decode_cursor() {
        // テスト項目: cursor メッセージの position を読み取れる
        // given (前提条件):
        let text = r#"{"type":"cursor","payload":{"position":{"lineNumber":3,"column":7}}}"#;

        // when (操作):
        let envelope = decode_envelope(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            envelope,
            Envelope::Cursor(CursorPayload {
                position: CursorPosition {
                    line_number: 3,
                    column: 7,
                },
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_decode_malformed_json() {
        // テスト項目: JSON として不正なフレームは Malformed になる
        // given (前提条件):
        let text = "not json at all";

        // when (操作):
        let result = decode_envelope(text);

        // then (期待する結果):
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_unknown_type() {
        // テスト項目: 未知の type は UnknownType になる
        // given (前提条件):
        let text = r#"{"type":"selection","payload":{}}"#;

        // when (操作):
        let result = decode_envelope(text);

        // then (期待する結果):
        assert!(matches!(result, Err(DecodeError::UnknownType(t)) if t == "selection"));
    }

    #[test]
    fn test_decode_invalid_payload_shape() {
        // テスト項目: payload がオブジェクトでない場合は InvalidPayload になる
        // given (前提条件):
        let text = r#"{"type":"cursor","payload":"top"}"#;

        // when (操作):
        let result = decode_envelope(text);

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(DecodeError::InvalidPayload {
                kind: MessageType::Cursor,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_chat_with_non_rfc3339_timestamp() {
        // テスト項目: RFC 3339 でないタイムスタンプは無視され、chat 自体はデコードできる
        // given (前提条件):
        let texts = [
            r#"{"type":"chat","payload":{"text":"hi","timestamp":1714557600000}}"#,
            r#"{"type":"chat","payload":{"text":"hi","timestamp":"yesterday"}}"#,
            r#"{"type":"chat","payload":{"text":"hi","timestamp":null}}"#,
        ];

        // when (操作):
        let results: Vec<_> = texts.iter().map(|text| decode_envelope(text)).collect();

        // then (期待する結果):
        for result in results {
            let Ok(Envelope::Chat(payload)) = result else {
                panic!("expected chat, got {:?}", result);
            };
            assert_eq!(payload.text, "hi");
            assert_eq!(payload.timestamp, None);
        }
    }

    #[test]
    fn test_decode_null_fields_fall_back_to_defaults() {
        // テスト項目: null や型違いのフィールドはデフォルト値になり、フレームは破棄されない
        // given (前提条件):
        let code_change = r#"{"type":"code_change","payload":{"code":null,"language":"js","userId":42}}"#;
        let cursor = r#"{"type":"cursor","payload":{"position":null,"username":"Bob"}}"#;
        let bad_column = r#"{"type":"cursor","payload":{"position":{"lineNumber":3,"column":-1}}}"#;

        // when (操作):
        let code_change = decode_envelope(code_change).unwrap();
        let cursor = decode_envelope(cursor).unwrap();
        let bad_column = decode_envelope(bad_column).unwrap();

        // then (期待する結果):
        let Envelope::CodeChange(payload) = code_change else {
            panic!("expected code_change");
        };
        assert_eq!(payload.code, "");
        assert_eq!(payload.language, "js");
        assert_eq!(payload.user_id, "");

        let Envelope::Cursor(payload) = cursor else {
            panic!("expected cursor");
        };
        assert_eq!(payload.position, CursorPosition::default());
        assert_eq!(payload.username, "Bob");

        let Envelope::Cursor(payload) = bad_column else {
            panic!("expected cursor");
        };
        assert_eq!(payload.position.line_number, 3);
        assert_eq!(payload.position.column, 0);
    }

    #[test]
    fn test_decode_missing_payload() {
        // テスト項目: payload が無い chat は空の payload として扱われる
        // given (前提条件):
        let text = r#"{"type":"chat"}"#;

        // when (操作):
        let envelope = decode_envelope(text).unwrap();

        // then (期待する結果):
        assert_eq!(envelope, Envelope::Chat(ChatPayload::default()));
    }

    #[test]
    fn test_encode_user_list() {
        // テスト項目: user_list は type と payload 配列で出力される
        // given (前提条件):
        let envelope = Envelope::UserList(vec![UserPresenceDto {
            user_id: "alice".to_string(),
            username: "Alice".to_string(),
            status: "online".to_string(),
        }]);

        // when (操作):
        let text = encode_envelope(&envelope).unwrap();

        // then (期待する結果):
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "user_list",
                "payload": [{"userId": "alice", "username": "Alice", "status": "online"}]
            })
        );
    }

    #[test]
    fn test_encode_empty_user_list_is_array() {
        // テスト項目: 空の user_list は null ではなく [] になる
        // given (前提条件):
        let envelope = Envelope::UserList(Vec::new());

        // when (操作):
        let text = encode_envelope(&envelope).unwrap();

        // then (期待する結果):
        assert_eq!(text, r#"{"type":"user_list","payload":[]}"#);
    }

    #[test]
    fn test_message_type_server_only() {
        // テスト項目: サーバー専用の type が判定できる
        // given (前提条件):
        let all = [
            MessageType::CodeChange,
            MessageType::Chat,
            MessageType::Cursor,
            MessageType::UserJoined,
            MessageType::UserLeft,
            MessageType::UserList,
        ];

        // when (操作):
        let server_only: Vec<&str> = all
            .iter()
            .filter(|kind| kind.is_server_only())
            .map(|kind| kind.as_str())
            .collect();

        // then (期待する結果):
        assert_eq!(server_only, vec!["user_joined", "user_left", "user_list"]);
        for kind in all {
            assert_eq!(MessageType::parse(kind.as_str()), Some(kind));
        }
    }
}
