//! Session store implementations.
//!
//! - `inmemory`: process-local store (reference implementation)

pub mod inmemory;

pub use inmemory::InMemorySessionStore;
