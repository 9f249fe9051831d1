//! Infrastructure layer: wire DTOs, the in-memory session store and the room hub.

pub mod dto;
pub mod repository;
pub mod room_hub;
