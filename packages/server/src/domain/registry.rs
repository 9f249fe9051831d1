//! Presence registry and broadcast router traits.
//!
//! Both are implemented by the room hub (`infrastructure::room_hub`). Use
//! cases depend on these traits only, which keeps them testable with mocks.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionIdentity, RegistryError, RoomId, RoomPresence, UserId};

/// Sending half of a connection's bounded outbound queue.
///
/// Items are serialized envelopes (JSON text frames).
pub type OutboundSender = mpsc::Sender<String>;

/// Receiving half of a connection's bounded outbound queue
pub type OutboundReceiver = mpsc::Receiver<String>;

/// A connection handed to the registry on register
#[derive(Debug)]
pub struct ConnectionHandle {
    pub identity: ConnectionIdentity,
    pub outbound: OutboundSender,
}

/// Membership & presence registry
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    /// Add a connection to its room and announce presence changes
    async fn register(&self, connection: ConnectionHandle) -> Result<(), RegistryError>;

    /// Remove a connection from its room; unknown connections are ignored
    async fn unregister(&self, identity: ConnectionIdentity) -> Result<(), RegistryError>;

    /// Presence of one room, `None` if nobody is connected to it
    async fn room_presence(&self, room_id: RoomId) -> Result<Option<RoomPresence>, RegistryError>;

    /// Presence of every active room
    async fn active_rooms(&self) -> Result<Vec<RoomPresence>, RegistryError>;
}

/// Broadcast router
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomBroadcaster: Send + Sync {
    /// Deliver `message` to every connection in the room except those of
    /// `exclude_user_id` (`None` excludes nobody)
    async fn broadcast_to_room(
        &self,
        room_id: RoomId,
        message: String,
        exclude_user_id: Option<UserId>,
    ) -> Result<(), RegistryError>;
}
