//! The room hub coordinator task.
//!
//! Owns the only `RoomMembership` and processes one `Command` at a time, so
//! first/last connection decisions never race with other sessions. Fan-out
//! uses `try_send` and never waits on a recipient: a connection whose queue
//! is full (or already closed) is evicted from its room.

use std::{collections::HashMap, time::Duration};

use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::AbortHandle,
};

use crate::{
    domain::{
        ConnectionHandle, ConnectionId, ConnectionIdentity, Departure, OutboundSender, PresenceKey,
        RoomId, RoomMembership, UserId,
    },
    infrastructure::dto::websocket::{Envelope, PresenceChangePayload, encode_envelope},
};

use super::command::Command;

pub(crate) struct Coordinator {
    membership: RoomMembership<OutboundSender>,
    /// Running grace timers, keyed by pending-leave generation
    leave_timers: HashMap<u64, AbortHandle>,
    grace_period: Duration,
    /// Handed to grace timers; weak so that dropping every `RoomHub` stops the loop
    commands: mpsc::WeakSender<Command>,
}

impl Coordinator {
    pub(crate) fn new(grace_period: Duration, commands: mpsc::WeakSender<Command>) -> Self {
        Self {
            membership: RoomMembership::new(),
            leave_timers: HashMap::new(),
            grace_period,
            commands,
        }
    }

    pub(crate) async fn run(mut self, mut receiver: mpsc::Receiver<Command>) {
        tracing::info!("Room hub coordinator started");

        while let Some(command) = receiver.recv().await {
            match command {
                Command::Register { connection } => self.register(connection),
                Command::Unregister { identity } => self.unregister(&identity),
                Command::Broadcast {
                    room_id,
                    message,
                    exclude_user_id,
                } => self.broadcast(&room_id, message, exclude_user_id.as_ref()),
                Command::LeaveGraceElapsed { key, generation } => {
                    self.finish_leave(&key, generation)
                }
                Command::RoomPresence { room_id, reply } => {
                    let _ = reply.send(self.membership.presence(&room_id));
                }
                Command::ActiveRooms { reply } => {
                    let _ = reply.send(self.membership.all_presence());
                }
                Command::Shutdown { reply } => {
                    let closed = self.drain();
                    let _ = reply.send(closed);
                    tracing::info!("Room hub coordinator stopped ({} connections closed)", closed);
                    return;
                }
            }
        }

        let closed = self.drain();
        tracing::info!(
            "Room hub coordinator stopped: all handles dropped ({} connections closed)",
            closed
        );
    }

    fn register(&mut self, connection: ConnectionHandle) {
        let ConnectionHandle { identity, outbound } = connection;
        let room_id = identity.room_id.clone();
        let joined = PresenceChangePayload::from(&identity);

        let outcome = self.membership.attach(identity.clone(), outbound);
        tracing::info!(
            room_id = %identity.room_id,
            user_id = %identity.user_id,
            connection_id = %identity.connection_id,
            "Connection registered ({} in room)",
            self.membership.connection_count(&room_id)
        );

        if let Some(cancelled) = outcome.cancelled_leave.as_ref() {
            if let Some(timer) = self.leave_timers.remove(&cancelled.generation) {
                timer.abort();
            }
            tracing::debug!(
                room_id = %identity.room_id,
                user_id = %identity.user_id,
                "Reconnected within grace period, pending leave cancelled"
            );
        }

        if outcome.announces_join() {
            self.broadcast_envelope(&room_id, &Envelope::UserJoined(joined), None);
        }

        self.publish_user_list(&room_id);
    }

    fn unregister(&mut self, identity: &ConnectionIdentity) {
        if !self.detach(&identity.room_id, &identity.connection_id) {
            tracing::debug!(
                room_id = %identity.room_id,
                connection_id = %identity.connection_id,
                "Unregister for a connection that is no longer a member, ignoring"
            );
        }
    }

    /// Remove a connection and apply the presence rules.
    ///
    /// Dropping the member drops the queue sender, which closes the
    /// connection's outbound queue. Returns `false` if it was not a member.
    fn detach(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let Some((member, departure)) = self.membership.detach(room_id, connection_id) else {
            return false;
        };
        let identity = member.identity;
        drop(member.sink);

        tracing::info!(
            room_id = %identity.room_id,
            user_id = %identity.user_id,
            connection_id = %identity.connection_id,
            "Connection unregistered ({} left in room)",
            self.membership.connection_count(room_id)
        );

        match departure {
            Departure::StillPresent => self.publish_user_list(room_id),
            Departure::Pending { key, pending } => self.schedule_leave(key, pending.generation),
        }

        true
    }

    fn schedule_leave(&mut self, key: PresenceKey, generation: u64) {
        let commands = self.commands.clone();
        let grace_period = self.grace_period;

        tracing::debug!(
            room_id = %key.room_id,
            user_id = %key.user_id,
            "Last connection closed, departure in {:?}",
            grace_period
        );

        let timer = tokio::spawn(async move {
            tokio::time::sleep(grace_period).await;
            if let Some(commands) = commands.upgrade() {
                let _ = commands
                    .send(Command::LeaveGraceElapsed { key, generation })
                    .await;
            }
        });
        self.leave_timers.insert(generation, timer.abort_handle());
    }

    fn finish_leave(&mut self, key: &PresenceKey, generation: u64) {
        self.leave_timers.remove(&generation);

        let Some(pending) = self.membership.finalize_leave(key, generation) else {
            tracing::debug!(
                room_id = %key.room_id,
                user_id = %key.user_id,
                "Grace timer fired for a superseded leave, ignoring"
            );
            return;
        };

        tracing::info!(
            room_id = %key.room_id,
            user_id = %key.user_id,
            "User left the room"
        );

        let left = Envelope::UserLeft(PresenceChangePayload {
            user_id: key.user_id.as_str().to_string(),
            username: pending.username.into_string(),
        });
        self.broadcast_envelope(&key.room_id, &left, None);
        self.publish_user_list(&key.room_id);
    }

    /// Recompute the room's user list from current membership and broadcast it
    fn publish_user_list(&mut self, room_id: &RoomId) {
        let users = self
            .membership
            .user_list(room_id)
            .into_iter()
            .map(Into::into)
            .collect();
        self.broadcast_envelope(room_id, &Envelope::UserList(users), None);
    }

    fn broadcast_envelope(
        &mut self,
        room_id: &RoomId,
        envelope: &Envelope,
        exclude_user_id: Option<&UserId>,
    ) {
        match encode_envelope(envelope) {
            Ok(message) => self.broadcast(room_id, message, exclude_user_id),
            Err(e) => tracing::error!(
                room_id = %room_id,
                "Failed to encode {} envelope: {}",
                envelope.message_type(),
                e
            ),
        }
    }

    /// Fan out to every member except `exclude_user_id`, evicting slow consumers
    fn broadcast(&mut self, room_id: &RoomId, message: String, exclude_user_id: Option<&UserId>) {
        let mut delivered = 0usize;
        let mut evicted: Vec<ConnectionId> = Vec::new();

        for member in self.membership.recipients(room_id, exclude_user_id) {
            match member.sink.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        room_id = %room_id,
                        user_id = %member.identity.user_id,
                        connection_id = %member.identity.connection_id,
                        "Outbound queue full, dropping unresponsive connection"
                    );
                    evicted.push(member.identity.connection_id.clone());
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        room_id = %room_id,
                        connection_id = %member.identity.connection_id,
                        "Outbound queue already closed, dropping connection"
                    );
                    evicted.push(member.identity.connection_id.clone());
                }
            }
        }

        tracing::debug!(
            room_id = %room_id,
            "Broadcast delivered to {} connection(s)",
            delivered
        );

        for connection_id in evicted {
            self.detach(room_id, &connection_id);
        }
    }

    /// Close every connection and cancel every timer
    fn drain(&mut self) -> usize {
        for (_, timer) in self.leave_timers.drain() {
            timer.abort();
        }
        // Dropping the senders closes every outbound queue
        self.membership.drain().len()
    }
}
