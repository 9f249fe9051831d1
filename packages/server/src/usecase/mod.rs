//! UseCase 層
//!
//! UI 層（WebSocket / HTTP handler）から呼ばれ、Domain 層の trait だけに依存する。

pub mod connect_participant;
pub mod disconnect_participant;
pub mod dispatch_message;
pub mod error;
pub mod get_room_presence;
pub mod get_rooms;

pub use connect_participant::{ConnectParticipantUseCase, DEFAULT_OUTBOUND_QUEUE_CAPACITY};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use dispatch_message::DispatchMessageUseCase;
pub use error::{
    ConnectError, DisconnectError, DispatchError, GetRoomPresenceError, GetRoomsError,
};
pub use get_room_presence::GetRoomPresenceUseCase;
pub use get_rooms::GetRoomsUseCase;
