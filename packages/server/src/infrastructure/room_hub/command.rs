//! Requests submitted to the room hub coordinator.

use tokio::sync::oneshot;

use crate::domain::{ConnectionHandle, ConnectionIdentity, PresenceKey, RoomId, RoomPresence, UserId};

/// One unit of work for the coordinator; processed strictly in submission order
#[derive(Debug)]
pub(crate) enum Command {
    Register {
        connection: ConnectionHandle,
    },
    Unregister {
        identity: ConnectionIdentity,
    },
    Broadcast {
        room_id: RoomId,
        message: String,
        exclude_user_id: Option<UserId>,
    },
    /// Sent by a grace timer once its delay has elapsed
    LeaveGraceElapsed {
        key: PresenceKey,
        generation: u64,
    },
    RoomPresence {
        room_id: RoomId,
        reply: oneshot::Sender<Option<RoomPresence>>,
    },
    ActiveRooms {
        reply: oneshot::Sender<Vec<RoomPresence>>,
    },
    /// Close every connection and stop the coordinator
    Shutdown {
        reply: oneshot::Sender<usize>,
    },
}
