//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tandem_server::infrastructure::dto::websocket::{Envelope, decode_envelope, encode_envelope};
use tandem_shared::time::{Clock, SystemClock};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};

use crate::{
    domain::{ClientConfig, parse_input},
    error::{ClientError, InputError},
};

use super::{
    formatter::MessageFormatter,
    ui::{prompt, redisplay_prompt},
};

/// Render one server frame for the terminal
fn render_frame(text: &str, current_user_id: &str) -> String {
    match decode_envelope(text) {
        Ok(Envelope::UserList(users)) => MessageFormatter::format_user_list(&users, current_user_id),
        Ok(Envelope::UserJoined(user)) => {
            MessageFormatter::format_user_joined(&user.username, &user.user_id)
        }
        Ok(Envelope::UserLeft(user)) => {
            MessageFormatter::format_user_left(&user.username, &user.user_id)
        }
        Ok(Envelope::Chat(chat)) => MessageFormatter::format_chat_message(&chat),
        Ok(Envelope::CodeChange(change)) => MessageFormatter::format_code_change(&change),
        Ok(Envelope::Cursor(cursor)) => MessageFormatter::format_cursor(&cursor),
        Err(e) => {
            tracing::debug!("Undecodable frame from server: {}", e);
            MessageFormatter::format_raw_message(text)
        }
    }
}

/// Run the WebSocket client session
pub async fn run_client_session(config: &ClientConfig) -> Result<(), ClientError> {
    let url = config.connect_url();

    let (ws_stream, _response) = match connect_async(url.as_str()).await {
        Ok(result) => result,
        Err(WsError::Http(response)) if response.status().as_u16() == 400 => {
            return Err(ClientError::InvalidIdentity(response.status().to_string()));
        }
        Err(e) => return Err(ClientError::ConnectionError(e.to_string())),
    };

    tracing::info!(room_id = %config.room_id, user_id = %config.user_id, "Connected to Tandem server");
    println!(
        "\nYou are '{}' in room '{}'. Type a message to chat, \
         /code <language> <code...> to share code, /cursor <line> <column> to move. \
         Press Ctrl+C to exit.\n",
        config.username, config.room_id
    );

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to handle incoming messages
    let user_id = config.user_id.clone();
    let username = config.username.clone();
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    print!("{}", render_frame(text.as_str(), &user_id));
                    redisplay_prompt(&username);
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(&username);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let line_prompt = prompt(&config.username);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&line_prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to turn input lines into messages
    let session_config = config.clone();
    let mut write_task = tokio::spawn(async move {
        let clock = SystemClock;
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let command = match parse_input(&line) {
                Ok(command) => command,
                Err(InputError::Empty) => continue,
                Err(e) => {
                    println!("{}", e);
                    redisplay_prompt(&session_config.username);
                    continue;
                }
            };

            let sent_at = clock.now();
            let envelope = command.into_envelope(&session_config, sent_at);
            let kind = envelope.message_type();
            let json = match encode_envelope(&envelope) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                write_error = true;
                break;
            }

            print!("\n{}", MessageFormatter::format_sent_confirmation(kind, &sent_at));
            redisplay_prompt(&session_config.username);
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(false) {
                return Err(ClientError::ConnectionError("Connection lost".to_string()));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            if write_result.unwrap_or(false) {
                return Err(ClientError::ConnectionError("Connection lost".to_string()));
            }
        }
    }

    Ok(())
}
