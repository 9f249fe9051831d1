//! UseCase: 受信メッセージの振り分け処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DispatchMessageUseCase::execute() メソッド
//! - type ごとの永続化とブロードキャスト（除外ユーザー、送信内容）
//!
//! ### なぜこのテストが必要か
//! - code_change / cursor は送信者以外に元のフレームのまま届く必要がある
//! - chat はサーバーが作り直したメッセージが送信者を含む全員に届く必要がある
//! - 永続化の失敗でブロードキャストが止まらないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：code_change / chat / cursor
//! - 異常系：不正な JSON、未知の type、サーバー専用の type
//! - 異常系：永続化の失敗（容量超過）

use std::sync::Arc;

use tandem_shared::time::Clock;

use crate::{
    domain::{ChatMessage, ConnectionIdentity, MessageIdFactory, RoomBroadcaster, SessionStore},
    infrastructure::dto::websocket::{
        ChatPayload, CodeChangePayload, Envelope, MessageType, decode_envelope, encode_envelope,
    },
};

use super::error::DispatchError;

/// 受信メッセージ振り分けのユースケース
pub struct DispatchMessageUseCase {
    /// SessionStore（永続化の抽象化）
    store: Arc<dyn SessionStore>,
    /// RoomBroadcaster（ブロードキャストの抽象化）
    broadcaster: Arc<dyn RoomBroadcaster>,
    /// chat のタイムスタンプに使う時計
    clock: Arc<dyn Clock>,
}

impl DispatchMessageUseCase {
    /// 新しい DispatchMessageUseCase を作成
    pub fn new(
        store: Arc<dyn SessionStore>,
        broadcaster: Arc<dyn RoomBroadcaster>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            broadcaster,
            clock,
        }
    }

    /// 1 フレームを処理する
    ///
    /// 配送先の Room は常に接続の Room で、payload に書かれた roomId は使わない。
    ///
    /// # Arguments
    ///
    /// * `connection` - フレームを受信した接続
    /// * `frame` - 受信したテキストフレーム（JSON）
    ///
    /// # Returns
    ///
    /// * `Ok(MessageType)` - 処理したメッセージの type
    /// * `Err(DispatchError)` - フレームを破棄した理由
    pub async fn execute(
        &self,
        connection: &ConnectionIdentity,
        frame: &str,
    ) -> Result<MessageType, DispatchError> {
        let envelope = decode_envelope(frame)?;
        let kind = envelope.message_type();
        if kind.is_server_only() {
            return Err(DispatchError::UnsupportedType(kind));
        }

        match envelope {
            Envelope::CodeChange(payload) => {
                self.handle_code_change(connection, payload, frame).await?
            }
            Envelope::Chat(payload) => self.handle_chat(connection, payload).await?,
            // cursor
            _ => self.relay_to_others(connection, frame).await?,
        }

        Ok(kind)
    }

    async fn handle_code_change(
        &self,
        connection: &ConnectionIdentity,
        payload: CodeChangePayload,
        frame: &str,
    ) -> Result<(), DispatchError> {
        if let Err(e) = self
            .store
            .save_code_snapshot(connection.room_id.clone(), payload.code, payload.language)
            .await
        {
            tracing::warn!(
                room_id = %connection.room_id,
                user_id = %connection.user_id,
                "Failed to save code snapshot: {}",
                e
            );
        }

        self.relay_to_others(connection, frame).await
    }

    async fn handle_chat(
        &self,
        connection: &ConnectionIdentity,
        payload: ChatPayload,
    ) -> Result<(), DispatchError> {
        let message = ChatMessage {
            room_id: connection.room_id.clone(),
            message_id: MessageIdFactory::generate(),
            user_id: connection.user_id.clone(),
            username: connection.username.clone(),
            text: payload.text,
            timestamp: self.clock.now(),
        };

        if let Err(e) = self.store.append_chat_message(message.clone()).await {
            tracing::warn!(
                room_id = %connection.room_id,
                user_id = %connection.user_id,
                message_id = %message.message_id,
                "Failed to store chat message: {}",
                e
            );
        }

        let text =
            encode_envelope(&Envelope::Chat(message.into())).map_err(DispatchError::Encode)?;
        self.broadcaster
            .broadcast_to_room(connection.room_id.clone(), text, None)
            .await?;
        Ok(())
    }

    /// 元のフレームをそのまま送信者以外に配信する
    async fn relay_to_others(
        &self,
        connection: &ConnectionIdentity,
        frame: &str,
    ) -> Result<(), DispatchError> {
        self.broadcaster
            .broadcast_to_room(
                connection.room_id.clone(),
                frame.to_string(),
                Some(connection.user_id.clone()),
            )
            .await?;
        Ok(())
    }
}
