//! Terminal client for Tandem rooms.
//!
//! Joins a room over WebSocket, prints what the other participants do and
//! turns stdin lines into chat, code and cursor messages.

mod domain;
pub mod error;
mod formatter;
mod runner;
mod session;
mod ui;

pub use domain::ClientConfig;
pub use runner::run_client;
