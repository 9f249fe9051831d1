//! Persistence collaborator trait.
//!
//! The core only ever writes through this trait, as a side effect of
//! dispatching a message. Its result never decides whether a broadcast
//! happens.

use async_trait::async_trait;

use super::{ChatMessage, RoomId, StoreError};

/// Storage for code snapshots and chat history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Save the current code and language of a room, replacing the previous snapshot
    async fn save_code_snapshot(
        &self,
        room_id: RoomId,
        code: String,
        language: String,
    ) -> Result<(), StoreError>;

    /// Append a chat message to the room's history
    async fn append_chat_message(&self, message: ChatMessage) -> Result<(), StoreError>;
}
