//! Domain logic for client-side operations.
//!
//! Pure functions only: input parsing, message construction and the
//! reconnect decision.

use chrono::{DateTime, Utc};
use tandem_server::infrastructure::dto::websocket::{
    ChatPayload, CodeChangePayload, CursorPayload, CursorPosition, Envelope,
};

use crate::error::{ClientError, InputError};

pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const RECONNECT_INTERVAL_SECS: u64 = 5;

const CODE_USAGE: &str = "/code <language> <code...>";
const CURSOR_USAGE: &str = "/cursor <line> <column>";

/// Where to connect and who to connect as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint without the room segment (e.g. `ws://127.0.0.1:8080/ws`)
    pub url: String,
    pub room_id: String,
    pub user_id: String,
    pub username: String,
}

impl ClientConfig {
    /// Full upgrade URL: `<url>/<room_id>?userId=..&username=..`
    pub fn connect_url(&self) -> String {
        format!(
            "{}/{}?userId={}&username={}",
            self.url.trim_end_matches('/'),
            encode_component(&self.room_id),
            encode_component(&self.user_id),
            encode_component(&self.username)
        )
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set
fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// What a stdin line asks the client to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Code { language: String, code: String },
    Cursor { line: u32, column: u32 },
    Chat(String),
}

/// Returns the arguments of `/name ...`, or `None` if `line` is another command
fn command_args<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// Parse one stdin line.
///
/// `/code <language> <code...>` replaces the shared code (a literal `\n`
/// becomes a line break), `/cursor <line> <column>` moves the cursor and
/// anything else is chat.
pub fn parse_input(line: &str) -> Result<ClientCommand, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(InputError::Empty);
    }

    if let Some(args) = command_args(line, "/code") {
        let (language, code) = args
            .split_once(char::is_whitespace)
            .ok_or(InputError::Usage(CODE_USAGE))?;
        return Ok(ClientCommand::Code {
            language: language.to_string(),
            code: code.trim_start().replace("\\n", "\n"),
        });
    }

    if let Some(args) = command_args(line, "/cursor") {
        let mut parts = args.split_whitespace();
        let (Some(line_number), Some(column), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(InputError::Usage(CURSOR_USAGE));
        };
        let line_number = line_number
            .parse()
            .map_err(|_| InputError::Usage(CURSOR_USAGE))?;
        let column = column.parse().map_err(|_| InputError::Usage(CURSOR_USAGE))?;
        return Ok(ClientCommand::Cursor {
            line: line_number,
            column,
        });
    }

    Ok(ClientCommand::Chat(line.to_string()))
}

impl ClientCommand {
    /// Build the outgoing envelope on behalf of `config`'s user
    pub fn into_envelope(self, config: &ClientConfig, now: DateTime<Utc>) -> Envelope {
        let room_id = config.room_id.clone();
        let user_id = config.user_id.clone();
        let username = config.username.clone();

        match self {
            ClientCommand::Code { language, code } => Envelope::CodeChange(CodeChangePayload {
                room_id,
                user_id,
                username,
                code,
                language,
                changes: None,
            }),
            ClientCommand::Cursor { line, column } => Envelope::Cursor(CursorPayload {
                room_id,
                user_id,
                username,
                position: CursorPosition {
                    line_number: line,
                    column,
                },
            }),
            ClientCommand::Chat(text) => Envelope::Chat(ChatPayload {
                room_id,
                message_id: None,
                user_id,
                username,
                text,
                timestamp: Some(now),
            }),
        }
    }
}

/// Check if the client should exit immediately based on the error type.
///
/// A rejected identity will be rejected again, so retrying is pointless.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::InvalidIdentity(_))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The number of reconnection attempts already made
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}
