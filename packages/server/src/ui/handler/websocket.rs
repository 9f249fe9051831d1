//! WebSocket connection handlers.
//!
//! One accepted session runs two loops: the receive loop (in the upgrade
//! task) and the send loop (spawned). Whichever ends first ends the
//! connection, and the connection is unregistered exactly once.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};

use crate::{
    config::SessionTimings,
    domain::{ConnectionIdentity, OutboundReceiver},
    ui::state::AppState,
    usecase::DispatchError,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectQuery {
    pub user_id: Option<String>,
    pub username: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let identity = match state.connect_participant_usecase.build_identity(
        room_id,
        query.user_id,
        query.username,
    ) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Rejecting WebSocket connection: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    tracing::info!(
        room_id = %identity.room_id,
        user_id = %identity.user_id,
        connection_id = %identity.connection_id,
        "Accepting WebSocket connection"
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: ConnectionIdentity) {
    let outbound = match state
        .connect_participant_usecase
        .execute(identity.clone())
        .await
    {
        Ok(outbound) => outbound,
        Err(e) => {
            tracing::error!(
                connection_id = %identity.connection_id,
                "Failed to register connection: {}",
                e
            );
            return;
        }
    };

    let timings = state.timings;
    let (sink, stream) = socket.split();
    let mut send_task = tokio::spawn(send_loop(sink, outbound, timings, identity.clone()));

    tokio::select! {
        _ = receive_loop(stream, &state, &identity, timings.read_timeout) => {
            // Unregistering drops the queue sender; the send loop then writes
            // a close frame and exits on its own
            disconnect(&state, &identity).await;
            if timeout(timings.write_timeout, &mut send_task).await.is_err() {
                send_task.abort();
            }
        }
        _ = &mut send_task => {
            disconnect(&state, &identity).await;
        }
    }

    tracing::info!(
        room_id = %identity.room_id,
        user_id = %identity.user_id,
        connection_id = %identity.connection_id,
        "WebSocket connection closed"
    );
}

async fn disconnect(state: &AppState, identity: &ConnectionIdentity) {
    if let Err(e) = state
        .disconnect_participant_usecase
        .execute(identity.clone())
        .await
    {
        tracing::warn!(
            connection_id = %identity.connection_id,
            "Failed to unregister connection: {}",
            e
        );
    }
}

/// Read frames until the client goes away or stays silent past `read_timeout`
async fn receive_loop(
    mut stream: SplitStream<WebSocket>,
    state: &AppState,
    identity: &ConnectionIdentity,
    read_timeout: Duration,
) {
    loop {
        let frame = match timeout(read_timeout, stream.next()).await {
            Err(_) => {
                tracing::info!(
                    connection_id = %identity.connection_id,
                    "No frame received within {:?}, closing connection",
                    read_timeout
                );
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                tracing::debug!(
                    connection_id = %identity.connection_id,
                    "WebSocket receive error: {}",
                    e
                );
                break;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Message::Text(text) => dispatch(state, identity, text.as_str()).await,
            Message::Binary(data) => {
                tracing::debug!(
                    connection_id = %identity.connection_id,
                    "Ignoring binary frame ({} bytes)",
                    data.len()
                );
            }
            Message::Ping(_) | Message::Pong(_) => {
                tracing::trace!(connection_id = %identity.connection_id, "Received ping/pong");
            }
            Message::Close(_) => {
                tracing::debug!(
                    connection_id = %identity.connection_id,
                    "Client requested close"
                );
                break;
            }
        }
    }
}

async fn dispatch(state: &AppState, identity: &ConnectionIdentity, frame: &str) {
    match state
        .dispatch_message_usecase
        .execute(identity, frame)
        .await
    {
        Ok(kind) => {
            tracing::debug!(
                room_id = %identity.room_id,
                user_id = %identity.user_id,
                "Dispatched {} message",
                kind
            );
        }
        Err(e @ (DispatchError::Decode(_) | DispatchError::UnsupportedType(_))) => {
            tracing::warn!(
                room_id = %identity.room_id,
                user_id = %identity.user_id,
                "Dropping inbound frame: {}",
                e
            );
        }
        Err(e) => {
            tracing::error!(
                room_id = %identity.room_id,
                user_id = %identity.user_id,
                "Failed to dispatch message: {}",
                e
            );
        }
    }
}

#[derive(Debug, Error)]
enum WriteError {
    #[error("write did not complete within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Transport(#[from] axum::Error),
}

/// Drain the outbound queue into the socket, pinging when idle
async fn send_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: OutboundReceiver,
    timings: SessionTimings,
    identity: ConnectionIdentity,
) {
    let period = timings.keepalive_interval;
    let mut keepalive = interval_at(Instant::now() + period, period);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let result = tokio::select! {
            message = outbound.recv() => match message {
                Some(text) => write(&mut sink, Message::Text(text.into()), timings.write_timeout).await,
                None => {
                    // The registry dropped this connection
                    if let Err(e) = write(&mut sink, Message::Close(None), timings.write_timeout).await {
                        tracing::debug!(
                            connection_id = %identity.connection_id,
                            "Failed to send close frame: {}",
                            e
                        );
                    }
                    break;
                }
            },
            _ = keepalive.tick() => {
                write(&mut sink, Message::Ping(Bytes::new()), timings.write_timeout).await
            }
        };

        if let Err(e) = result {
            tracing::debug!(
                connection_id = %identity.connection_id,
                "WebSocket send failed: {}",
                e
            );
            break;
        }
        keepalive.reset();
    }
}

async fn write(
    sink: &mut SplitSink<WebSocket, Message>,
    message: Message,
    deadline: Duration,
) -> Result<(), WriteError> {
    match timeout(deadline, sink.send(message)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(WriteError::Timeout(deadline)),
    }
}
