//! UseCase 層のエラー型

use thiserror::Error;

use crate::{
    domain::{RegistryError, ValueObjectError},
    infrastructure::dto::websocket::{DecodeError, MessageType},
};

/// 接続処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// 接続パラメータ（roomId / userId / username）が不正
    #[error("invalid connection parameter: {0}")]
    InvalidIdentity(#[from] ValueObjectError),

    /// 接続パラメータが指定されていない
    #[error("missing connection parameter '{0}'")]
    MissingIdentity(&'static str),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// 切断処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisconnectError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// 受信フレームのディスパッチ処理のエラー
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// クライアントから送られてはいけない type
    #[error("message type '{0}' is not accepted from clients")]
    UnsupportedType(MessageType),

    #[error("broadcast failed: {0}")]
    Broadcast(#[from] RegistryError),

    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Room 一覧取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomsError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Room の在室状況取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomPresenceError {
    #[error("invalid room id: {0}")]
    InvalidRoomId(#[source] ValueObjectError),

    #[error("room '{0}' has no connections")]
    RoomNotFound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
