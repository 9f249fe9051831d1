//! Message formatting utilities for client display.

use chrono::{DateTime, Utc};
use tandem_server::infrastructure::dto::websocket::{
    ChatPayload, CodeChangePayload, CursorPayload, MessageType, UserPresenceDto,
};
use tandem_shared::time::to_jst_clock_time;

const HEAVY_RULE: &str = "============================================================";
const LIGHT_RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the `user_list` snapshot, marking the current user with "(me)"
    pub fn format_user_list(users: &[UserPresenceDto], current_user_id: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", HEAVY_RULE));
        output.push_str("In this room:\n");

        if users.is_empty() {
            output.push_str("(No participants)\n");
        } else {
            for user in users {
                let me_suffix = if user.user_id == current_user_id {
                    " (me)"
                } else {
                    ""
                };
                output.push_str(&format!(
                    "{} [{}]{} - {}\n",
                    user.username, user.user_id, me_suffix, user.status
                ));
            }
        }

        output.push_str(HEAVY_RULE);
        output.push('\n');
        output
    }

    pub fn format_user_joined(username: &str, user_id: &str) -> String {
        format!("\n+ {} [{}] joined\n", username, user_id)
    }

    pub fn format_user_left(username: &str, user_id: &str) -> String {
        format!("\n- {} [{}] left\n", username, user_id)
    }

    /// Format a chat message
    ///
    /// The server stamps every chat it relays; a missing timestamp is shown
    /// as `--:--:--`.
    pub fn format_chat_message(chat: &ChatPayload) -> String {
        let sent_at = chat
            .timestamp
            .as_ref()
            .map(to_jst_clock_time)
            .unwrap_or_else(|| "--:--:--".to_string());
        format!(
            "\n\n{}\n\
             @{}: {}\n\
             sent at {}\n\
             {}\n",
            LIGHT_RULE, chat.username, chat.text, sent_at, LIGHT_RULE
        )
    }

    /// Format a full code snapshot pushed by another participant
    pub fn format_code_change(change: &CodeChangePayload) -> String {
        let line_count = change.code.lines().count();
        let line_word = if line_count == 1 { "line" } else { "lines" };
        let mut output = format!(
            "\n\n{}\n{} updated the code ({}, {} {})\n{}\n",
            HEAVY_RULE, change.username, change.language, line_count, line_word, LIGHT_RULE
        );
        for (index, line) in change.code.lines().enumerate() {
            output.push_str(&format!("{:>4} | {}\n", index + 1, line));
        }
        output.push_str(HEAVY_RULE);
        output.push('\n');
        output
    }

    pub fn format_cursor(cursor: &CursorPayload) -> String {
        format!(
            "\n~ {} is at line {}, column {}\n",
            cursor.username, cursor.position.line_number, cursor.position.column
        )
    }

    /// Format a confirmation message after sending
    pub fn format_sent_confirmation(kind: MessageType, sent_at: &DateTime<Utc>) -> String {
        format!("{} sent at {}\n", kind, to_jst_clock_time(sent_at))
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when decoding fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
