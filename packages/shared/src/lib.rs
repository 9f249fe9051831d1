//! Utilities shared by the Tandem server and client: logging setup and time.

pub mod logger;
pub mod time;
