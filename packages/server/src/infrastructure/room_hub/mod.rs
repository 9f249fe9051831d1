//! Room hub: membership registry and broadcast router.
//!
//! ## 責務
//!
//! - Room ごとの接続の管理（register / unregister）
//! - 在室状況の通知（`user_joined` / `user_left` / `user_list`）
//! - Room 単位のブロードキャスト（送信者の除外、遅いクライアントの切断）
//!
//! ## 設計ノート
//!
//! 状態はすべて 1 つの coordinator タスク（`coordinator.rs`）が所有し、
//! `RoomHub` はそのタスクへコマンドを送るだけのハンドルです。
//! ロックを使わずに、処理順序はコマンドの投入順で一意に決まります。
//!
//! - `RoomHub`: `PresenceRegistry` と `RoomBroadcaster` を実装する（Clone 可能）
//! - `Coordinator`: `RoomMembership` と猶予タイマーを所有する

mod command;
mod coordinator;

use std::time::Duration;

use async_trait::async_trait;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::domain::{
    ConnectionHandle, ConnectionIdentity, PresenceRegistry, RegistryError, RoomBroadcaster,
    RoomId, RoomPresence, UserId,
};

use command::Command;
use coordinator::Coordinator;

/// Default departure grace period
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Default capacity of the coordinator command queue
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;

/// Room hub settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Delay between a user's last connection closing and `user_left`
    pub grace_period: Duration,
    pub command_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

/// Handle to the room hub coordinator
#[derive(Debug, Clone)]
pub struct RoomHub {
    commands: mpsc::Sender<Command>,
}

impl RoomHub {
    /// Spawn the coordinator task and return a handle to it.
    ///
    /// The coordinator stops on `shutdown` or once every handle is dropped.
    pub fn spawn(config: HubConfig) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(config.command_capacity.max(1));
        let coordinator = Coordinator::new(config.grace_period, commands.downgrade());
        let task = tokio::spawn(coordinator.run(receiver));

        (Self { commands }, task)
    }

    /// Close every connection's outbound queue and stop the coordinator.
    ///
    /// Returns the number of connections that were still open.
    pub async fn shutdown(&self) -> Result<usize, RegistryError> {
        let (reply, response) = oneshot::channel();
        self.submit(Command::Shutdown { reply }).await?;
        response
            .await
            .map_err(|_| RegistryError::CoordinatorUnavailable)
    }

    async fn submit(&self, command: Command) -> Result<(), RegistryError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RegistryError::CoordinatorUnavailable)
    }
}

#[async_trait]
impl PresenceRegistry for RoomHub {
    async fn register(&self, connection: ConnectionHandle) -> Result<(), RegistryError> {
        self.submit(Command::Register { connection }).await
    }

    async fn unregister(&self, identity: ConnectionIdentity) -> Result<(), RegistryError> {
        self.submit(Command::Unregister { identity }).await
    }

    async fn room_presence(&self, room_id: RoomId) -> Result<Option<RoomPresence>, RegistryError> {
        let (reply, response) = oneshot::channel();
        self.submit(Command::RoomPresence { room_id, reply }).await?;
        response
            .await
            .map_err(|_| RegistryError::CoordinatorUnavailable)
    }

    async fn active_rooms(&self) -> Result<Vec<RoomPresence>, RegistryError> {
        let (reply, response) = oneshot::channel();
        self.submit(Command::ActiveRooms { reply }).await?;
        response
            .await
            .map_err(|_| RegistryError::CoordinatorUnavailable)
    }
}

#[async_trait]
impl RoomBroadcaster for RoomHub {
    async fn broadcast_to_room(
        &self,
        room_id: RoomId,
        message: String,
        exclude_user_id: Option<UserId>,
    ) -> Result<(), RegistryError> {
        self.submit(Command::Broadcast {
            room_id,
            message,
            exclude_user_id,
        })
        .await
    }
}
