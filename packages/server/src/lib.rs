//! Tandem session server library.
//!
//! Accepts room-scoped WebSocket sessions, tracks who is present in each room
//! and fans code edits, chat and cursor positions out to the other members.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
