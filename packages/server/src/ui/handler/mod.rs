//! HTTP and WebSocket handlers.

mod http;
mod websocket;

pub use http::{get_room_presence, get_rooms, health, health_check};
pub use websocket::websocket_handler;
