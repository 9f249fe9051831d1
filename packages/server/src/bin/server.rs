//! Tandem collaborative session server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tandem-server
//! cargo run --bin tandem-server -- --host 0.0.0.0 --port 3000 --grace-period-ms 5000
//! ```

use std::time::Duration;

use clap::Parser;
use tandem_server::{
    config::{ServerConfig, SessionTimings},
    ui::Server,
};
use tandem_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tandem-server")]
#[command(about = "Real-time collaborative coding session server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TANDEM_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TANDEM_PORT", default_value_t = 8080)]
    port: u16,

    /// Delay before announcing that a user left (milliseconds)
    #[arg(long, default_value_t = 2000)]
    grace_period_ms: u64,

    /// Drop a connection after this many seconds without any inbound frame
    #[arg(long, default_value_t = 60)]
    read_timeout_secs: u64,

    /// Deadline for a single outbound write (seconds)
    #[arg(long, default_value_t = 10)]
    write_timeout_secs: u64,

    /// Ping interval when idle (seconds)
    #[arg(long, default_value_t = 54)]
    keepalive_interval_secs: u64,

    /// Capacity of each connection's outbound queue (at least 2)
    #[arg(long, default_value_t = 256)]
    outbound_queue_capacity: usize,

    /// Maximum chat messages kept per room
    #[arg(long, default_value_t = 1000)]
    chat_history_capacity: usize,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            grace_period: Duration::from_millis(self.grace_period_ms),
            timings: SessionTimings {
                read_timeout: Duration::from_secs(self.read_timeout_secs),
                write_timeout: Duration::from_secs(self.write_timeout_secs),
                keepalive_interval: Duration::from_secs(self.keepalive_interval_secs),
            },
            outbound_queue_capacity: self.outbound_queue_capacity,
            chat_history_capacity: self.chat_history_capacity,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = args.server_config();
    let server = match Server::from_config(&config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
