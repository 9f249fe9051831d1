//! Shared application state.

use std::sync::Arc;

use crate::{
    config::SessionTimings,
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, DispatchMessageUseCase,
        GetRoomPresenceUseCase, GetRoomsUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// DispatchMessageUseCase（受信メッセージ振り分けのユースケース）
    pub dispatch_message_usecase: Arc<DispatchMessageUseCase>,
    /// GetRoomsUseCase（Room 一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomPresenceUseCase（在室状況取得のユースケース）
    pub get_room_presence_usecase: Arc<GetRoomPresenceUseCase>,
    /// 接続ごとの I/O タイムアウト
    pub timings: SessionTimings,
}
