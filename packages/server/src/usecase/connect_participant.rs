//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::build_identity()（接続パラメータの検証）
//! - ConnectParticipantUseCase::execute()（送信キューの生成と Registry への登録）
//!
//! ### なぜこのテストが必要か
//! - 不正なパラメータでの接続は upgrade 前に拒否する必要がある
//! - Registry に渡される接続情報とキューが正しいことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：有効なパラメータでの接続
//! - 異常系：パラメータ欠落・空文字・長すぎる値
//! - 異常系：coordinator 停止中の登録

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::{
    ConnectionHandle, ConnectionIdFactory, ConnectionIdentity, OutboundReceiver,
    PresenceRegistry, RoomId, UserId, Username,
};

use super::error::ConnectError;

/// 送信キューのデフォルト容量
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// PresenceRegistry（在室管理の抽象化）
    registry: Arc<dyn PresenceRegistry>,
    /// 接続ごとの送信キューの容量
    outbound_queue_capacity: usize,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(registry: Arc<dyn PresenceRegistry>, outbound_queue_capacity: usize) -> Self {
        Self {
            registry,
            outbound_queue_capacity: outbound_queue_capacity.max(1),
        }
    }

    /// 接続パラメータを検証して接続情報を作る
    ///
    /// 接続 ID はサーバー側で生成する（UUID v4）。
    pub fn build_identity(
        &self,
        room_id: String,
        user_id: Option<String>,
        username: Option<String>,
    ) -> Result<ConnectionIdentity, ConnectError> {
        let room_id = RoomId::new(room_id)?;
        let user_id = UserId::new(user_id.ok_or(ConnectError::MissingIdentity("userId"))?)?;
        let username = Username::new(username.ok_or(ConnectError::MissingIdentity("username"))?)?;

        Ok(ConnectionIdentity::new(
            ConnectionIdFactory::generate(),
            user_id,
            username,
            room_id,
        ))
    }

    /// 参加者接続を実行
    ///
    /// 送信キューを生成して sender を Registry に登録し、receiver を返す。
    /// 以降 sender を持つのは Registry だけで、Registry がそれを手放すと
    /// キューが閉じる。
    ///
    /// # Returns
    ///
    /// * `Ok(OutboundReceiver)` - 接続の送信ループが読むキュー
    /// * `Err(ConnectError)` - 登録失敗
    pub async fn execute(
        &self,
        identity: ConnectionIdentity,
    ) -> Result<OutboundReceiver, ConnectError> {
        let (outbound, receiver) = mpsc::channel(self.outbound_queue_capacity);

        self.registry
            .register(ConnectionHandle { identity, outbound })
            .await?;

        Ok(receiver)
    }
}
