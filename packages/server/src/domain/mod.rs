//! Domain layer: value objects, entities, membership state and the traits
//! the core depends on.

pub mod entity;
pub mod error;
pub mod membership;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use entity::{
    ChatMessage, CodeSnapshot, ConnectionIdentity, PresenceStatus, RoomPresence, UserPresence,
};
pub use error::{RegistryError, StoreError, ValueObjectError};
pub use membership::{AttachOutcome, Departure, Member, PendingLeave, PresenceKey, RoomMembership};
pub use registry::{
    ConnectionHandle, OutboundReceiver, OutboundSender, PresenceRegistry, RoomBroadcaster,
};
pub use repository::SessionStore;
pub use value_object::{
    ConnectionId, ConnectionIdFactory, MessageId, MessageIdFactory, RoomId, UserId, Username,
};

#[cfg(test)]
pub use registry::{MockPresenceRegistry, MockRoomBroadcaster};
#[cfg(test)]
pub use repository::MockSessionStore;
