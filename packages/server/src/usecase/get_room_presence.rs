//! UseCase: Room の在室状況取得
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続のある Room
//! - 異常系：接続の無い Room（404 相当）
//! - 異常系：不正な room_id（400 相当）

use std::sync::Arc;

use crate::domain::{PresenceRegistry, RoomId, RoomPresence};

use super::error::GetRoomPresenceError;

/// Room の在室状況取得のユースケース
pub struct GetRoomPresenceUseCase {
    registry: Arc<dyn PresenceRegistry>,
}

impl GetRoomPresenceUseCase {
    pub fn new(registry: Arc<dyn PresenceRegistry>) -> Self {
        Self { registry }
    }

    /// Room の在室状況を取得
    ///
    /// # Arguments
    ///
    /// * `room_id` - Room ID（文字列、ここで検証する）
    pub async fn execute(&self, room_id: String) -> Result<RoomPresence, GetRoomPresenceError> {
        let room_id = RoomId::new(room_id).map_err(GetRoomPresenceError::InvalidRoomId)?;

        self.registry
            .room_presence(room_id.clone())
            .await?
            .ok_or_else(|| GetRoomPresenceError::RoomNotFound(room_id.into_string()))
    }
}
