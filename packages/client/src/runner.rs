//! Client execution logic with reconnection support.

use std::time::Duration;

use super::{
    domain::{
        ClientConfig, MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL_SECS, should_attempt_reconnect,
        should_exit_immediately,
    },
    error::ClientError,
    session::run_client_session,
};

/// Run the WebSocket client with reconnection logic
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            config.url,
            config.user_id,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        let error = match run_client_session(&config).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => e,
        };

        if should_exit_immediately(&error) {
            tracing::error!(
                "Room '{}' refused user '{}'. Exiting.",
                config.room_id,
                config.user_id
            );
            return Err(error);
        }

        tracing::warn!("Connection lost: {}", error);
        reconnect_count += 1;

        if !should_attempt_reconnect(&error, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
            tracing::error!(
                "Failed to reconnect after {} attempts. Exiting.",
                MAX_RECONNECT_ATTEMPTS
            );
            return Err(error);
        }

        tracing::info!(
            "Reconnecting in {} seconds... (attempt {}/{})",
            RECONNECT_INTERVAL_SECS,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
    }
}
