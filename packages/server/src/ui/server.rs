//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tandem_shared::time::SystemClock;
use thiserror::Error;
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::trace::TraceLayer;

use crate::{
    config::{ConfigError, ServerConfig},
    infrastructure::{repository::InMemorySessionStore, room_hub::RoomHub},
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, DispatchMessageUseCase,
        GetRoomPresenceUseCase, GetRoomsUseCase,
    },
};

use super::{
    handler::{get_room_presence, get_rooms, health, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Collaborative session server
///
/// Owns the room hub and the use cases wired on top of it.
///
/// # Example
///
/// ```ignore
/// let server = Server::from_config(&ServerConfig::default())?;
/// server.run("127.0.0.1", 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    room_hub: RoomHub,
    hub_task: JoinHandle<()>,
    session_store: Arc<InMemorySessionStore>,
}

impl Server {
    /// Validate `config`, start the room hub and wire the use cases.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        // 1. Persistence collaborator (in-memory reference implementation)
        let session_store = Arc::new(InMemorySessionStore::new(config.chat_history_capacity));

        // 2. Room hub (registry + broadcast router)
        let (room_hub, hub_task) = RoomHub::spawn(config.hub_config());
        let registry = Arc::new(room_hub.clone());

        // 3. UseCases
        let state = Arc::new(AppState {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                registry.clone(),
                config.outbound_queue_capacity,
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                registry.clone(),
            )),
            dispatch_message_usecase: Arc::new(DispatchMessageUseCase::new(
                session_store.clone(),
                registry.clone(),
                Arc::new(SystemClock),
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(registry.clone())),
            get_room_presence_usecase: Arc::new(GetRoomPresenceUseCase::new(registry)),
            timings: config.timings,
        });

        Ok(Self {
            state,
            room_hub,
            hub_task,
            session_store,
        })
    }

    /// The persistence collaborator the server writes to
    pub fn session_store(&self) -> Arc<InMemorySessionStore> {
        self.session_store.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws/{room_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/health", get(health))
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}/presence", get(get_room_presence))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind `host:port` and serve until Ctrl+C / SIGTERM
    pub async fn run(self, host: &str, port: u16) -> Result<(), ServerError> {
        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        let local_addr = listener.local_addr()?;
        tracing::info!("Tandem session server listening on {}", local_addr);
        tracing::info!("Connect to: ws://{}/ws/{{room_id}}?userId=..&username=..", local_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// On shutdown the room hub closes every outbound queue, so each
    /// connection sends a close frame before the server stops.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let room_hub = self.room_hub.clone();
        let drain = async move {
            shutdown.await;
            match room_hub.shutdown().await {
                Ok(closed) => tracing::info!("Closed {} open connection(s)", closed),
                Err(e) => tracing::warn!("Room hub already stopped: {}", e),
            }
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(drain)
            .await?;

        drop(self.room_hub);
        drop(self.state);
        if let Err(e) = self.hub_task.await {
            tracing::warn!("Room hub task ended abnormally: {}", e);
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
