//! Value objects identifying rooms, users and connections.
//!
//! Every identifier is a validated, immutable string. Construction goes
//! through `new` (or `TryFrom<String>`) so that an empty or oversized value
//! never reaches the membership state.

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of room and user identifiers
pub const MAX_ID_LENGTH: usize = 128;
/// Maximum length of a display name
pub const MAX_USERNAME_LENGTH: usize = 64;

fn validate(field: &'static str, value: &str, max: usize) -> Result<(), ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty { field });
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(ValueObjectError::TooLong { field, max, actual });
    }
    Ok(())
}

macro_rules! string_value_object {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap the given value
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validate($field, &value, $max)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_value_object!(
    /// Identifier of a collaboration room
    RoomId,
    "room_id",
    MAX_ID_LENGTH
);

string_value_object!(
    /// Identifier of a user (stable across connections and tabs)
    UserId,
    "user_id",
    MAX_ID_LENGTH
);

string_value_object!(
    /// Display name of a user
    Username,
    "username",
    MAX_USERNAME_LENGTH
);

string_value_object!(
    /// Identifier of one accepted duplex session
    ConnectionId,
    "connection_id",
    MAX_ID_LENGTH
);

string_value_object!(
    /// Identifier of a persisted chat message
    MessageId,
    "message_id",
    MAX_ID_LENGTH
);

/// Factory for server-generated connection ids (UUID v4)
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> ConnectionId {
        ConnectionId(Uuid::new_v4().to_string())
    }
}

/// Factory for server-generated chat message ids (UUID v4)
pub struct MessageIdFactory;

impl MessageIdFactory {
    pub fn generate() -> MessageId {
        MessageId(Uuid::new_v4().to_string())
    }
}
