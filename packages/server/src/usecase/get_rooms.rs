//! UseCase: Room 一覧取得

use std::sync::Arc;

use crate::domain::{PresenceRegistry, RoomPresence};

use super::error::GetRoomsError;

/// アクティブな Room 一覧取得のユースケース
pub struct GetRoomsUseCase {
    registry: Arc<dyn PresenceRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(registry: Arc<dyn PresenceRegistry>) -> Self {
        Self { registry }
    }

    /// 接続が1つ以上ある Room の在室状況を room_id 順で返す
    pub async fn execute(&self) -> Result<Vec<RoomPresence>, GetRoomsError> {
        Ok(self.registry.active_rooms().await?)
    }
}
