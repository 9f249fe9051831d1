//! Terminal client for a Tandem room with reconnection support.
//!
//! Joins a room, prints presence, chat, code and cursor events and sends
//! stdin lines as messages. Automatically reconnects on disconnection
//! (max 5 attempts with 5 second interval). Rejected parameters exit at once.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tandem-client -- --room pairing --user-id alice --username Alice
//! cargo run --bin tandem-client -- -r pairing -i bob -n Bob -u ws://127.0.0.1:8080/ws
//! ```

use clap::Parser;

use tandem_client::{ClientConfig, run_client};
use tandem_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tandem-client")]
#[command(about = "Terminal client for Tandem collaborative coding rooms", long_about = None)]
struct Args {
    /// Room to join
    #[arg(short = 'r', long)]
    room: String,

    /// Stable user id (the same id in several terminals counts as one user)
    #[arg(short = 'i', long)]
    user_id: String,

    /// Display name
    #[arg(short = 'n', long)]
    username: String,

    /// WebSocket server URL, without the room segment
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = ClientConfig {
        url: args.url,
        room_id: args.room,
        user_id: args.user_id,
        username: args.username,
    };

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
