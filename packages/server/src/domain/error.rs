//! Domain layer error types.

use thiserror::Error;

/// Validation errors raised when constructing value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// The value is empty (or whitespace only)
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// The value exceeds the maximum length
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

/// Errors returned by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The chat history of the room reached its capacity
    #[error("chat history of room '{room_id}' is full (capacity: {capacity})")]
    HistoryCapacityExceeded { room_id: String, capacity: usize },

    /// The backing store could not be reached
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by the presence registry / broadcast router
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The coordinator task has stopped (shutdown or crash)
    #[error("room hub coordinator is not running")]
    CoordinatorUnavailable,
}
