//! Room membership and presence state.
//!
//! `RoomMembership` is the single source of truth for "room → connections"
//! and for pending leaves. It holds no locks and spawns nothing; the room hub
//! coordinator owns the only instance and applies every mutation one at a
//! time.
//!
//! The type is generic over the per-connection sink `C` so the presence rules
//! can be tested without real channels.

use std::collections::{BTreeMap, HashMap};

use super::{
    entity::{ConnectionIdentity, RoomPresence, UserPresence},
    value_object::{ConnectionId, RoomId, UserId, Username},
};

/// A connection currently held in a room
#[derive(Debug)]
pub struct Member<C> {
    pub identity: ConnectionIdentity,
    pub sink: C,
}

/// Key of a pending leave: a user's presence in one room
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PresenceKey {
    pub room_id: RoomId,
    pub user_id: UserId,
}

impl PresenceKey {
    pub fn of(identity: &ConnectionIdentity) -> Self {
        Self {
            room_id: identity.room_id.clone(),
            user_id: identity.user_id.clone(),
        }
    }
}

/// A departure waiting for its grace period to elapse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLeave {
    /// Unique per scheduled leave; a timer carrying an older generation is stale
    pub generation: u64,
    pub username: Username,
}

/// Result of attaching a connection to its room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachOutcome {
    /// No other connection of this user was in the room before insertion
    pub first_connection: bool,
    /// Pending leave cancelled by this attach (a reconnect within the grace period)
    pub cancelled_leave: Option<PendingLeave>,
}

impl AttachOutcome {
    /// Whether observers should see a `user_joined` event
    pub fn announces_join(&self) -> bool {
        self.first_connection && self.cancelled_leave.is_none()
    }
}

/// What a detach means for the user's presence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The user still holds another connection in the room
    StillPresent,
    /// That was the user's last connection; a leave is now pending
    Pending {
        key: PresenceKey,
        pending: PendingLeave,
    },
}

/// Membership of every room plus pending leaves
#[derive(Debug)]
pub struct RoomMembership<C> {
    rooms: HashMap<RoomId, HashMap<ConnectionId, Member<C>>>,
    pending_leaves: HashMap<PresenceKey, PendingLeave>,
    next_generation: u64,
}

impl<C> Default for RoomMembership<C> {
    fn default() -> Self {
        Self {
            rooms: HashMap::new(),
            pending_leaves: HashMap::new(),
            next_generation: 0,
        }
    }
}

impl<C> RoomMembership<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to its room, creating the room lazily.
    ///
    /// "First connection" is decided before insertion. A pending leave of the
    /// same user in the same room is cancelled and returned.
    pub fn attach(&mut self, identity: ConnectionIdentity, sink: C) -> AttachOutcome {
        let key = PresenceKey::of(&identity);
        let members = self.rooms.entry(identity.room_id.clone()).or_default();

        let first_connection = !members
            .values()
            .any(|member| member.identity.user_id == identity.user_id);

        members.insert(
            identity.connection_id.clone(),
            Member { identity, sink },
        );

        let cancelled_leave = self.pending_leaves.remove(&key);

        AttachOutcome {
            first_connection,
            cancelled_leave,
        }
    }

    /// Remove a connection from its room.
    ///
    /// Returns `None` when the connection is not a member (already removed).
    /// The room entry is dropped as soon as it becomes empty. When the removed
    /// connection was the user's last one in the room, a pending leave is
    /// recorded and returned.
    pub fn detach(
        &mut self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<(Member<C>, Departure)> {
        let members = self.rooms.get_mut(room_id)?;
        let member = members.remove(connection_id)?;

        let still_present = members
            .values()
            .any(|other| other.identity.user_id == member.identity.user_id);

        if members.is_empty() {
            self.rooms.remove(room_id);
        }

        if still_present {
            return Some((member, Departure::StillPresent));
        }

        self.next_generation += 1;
        let key = PresenceKey::of(&member.identity);
        let pending = PendingLeave {
            generation: self.next_generation,
            username: member.identity.username.clone(),
        };
        self.pending_leaves.insert(key.clone(), pending.clone());

        Some((member, Departure::Pending { key, pending }))
    }

    /// Make a pending leave final.
    ///
    /// Only succeeds when `generation` is still the current pending leave for
    /// `key`; a leave that was cancelled or superseded returns `None`.
    pub fn finalize_leave(&mut self, key: &PresenceKey, generation: u64) -> Option<PendingLeave> {
        match self.pending_leaves.get(key) {
            Some(pending) if pending.generation == generation => self.pending_leaves.remove(key),
            _ => None,
        }
    }

    pub fn is_leave_pending(&self, key: &PresenceKey) -> bool {
        self.pending_leaves.contains_key(key)
    }

    /// Members of the room that should receive a broadcast.
    ///
    /// `exclude_user_id` filters out every connection of that user; `None`
    /// excludes nobody.
    pub fn recipients(
        &self,
        room_id: &RoomId,
        exclude_user_id: Option<&UserId>,
    ) -> Vec<&Member<C>> {
        self.rooms
            .get(room_id)
            .map(|members| {
                members
                    .values()
                    .filter(|member| Some(&member.identity.user_id) != exclude_user_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Present users of the room, each user once, ordered by user id.
    ///
    /// Computed from current membership on every call.
    pub fn user_list(&self, room_id: &RoomId) -> Vec<UserPresence> {
        let Some(members) = self.rooms.get(room_id) else {
            return Vec::new();
        };

        let mut users: BTreeMap<&UserId, &Username> = BTreeMap::new();
        for member in members.values() {
            users
                .entry(&member.identity.user_id)
                .or_insert(&member.identity.username);
        }

        users
            .into_iter()
            .map(|(user_id, username)| UserPresence::online(user_id.clone(), username.clone()))
            .collect()
    }

    pub fn presence(&self, room_id: &RoomId) -> Option<RoomPresence> {
        let members = self.rooms.get(room_id)?;
        Some(RoomPresence {
            room_id: room_id.clone(),
            users: self.user_list(room_id),
            connection_count: members.len(),
        })
    }

    /// Presence of every active room, ordered by room id
    pub fn all_presence(&self) -> Vec<RoomPresence> {
        let mut room_ids: Vec<&RoomId> = self.rooms.keys().collect();
        room_ids.sort();
        room_ids
            .into_iter()
            .filter_map(|room_id| self.presence(room_id))
            .collect()
    }

    pub fn connection_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, HashMap::len)
    }

    pub fn contains(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|members| members.contains_key(connection_id))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Remove every member and pending leave, returning the members
    pub fn drain(&mut self) -> Vec<Member<C>> {
        self.pending_leaves.clear();
        self.rooms
            .drain()
            .flat_map(|(_, members)| members.into_values())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::ConnectionIdFactory;

    fn identity(user: &str, room: &str) -> ConnectionIdentity {
        ConnectionIdentity::new(
            ConnectionIdFactory::generate(),
            UserId::new(user.to_string()).unwrap(),
            Username::new(format!("{}-name", user)).unwrap(),
            RoomId::new(room.to_string()).unwrap(),
        )
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_attach_first_connection_announces_join() {
        // テスト項目: ユーザーの最初の接続は join として扱われる
        // given (前提条件):
        let mut membership = RoomMembership::new();

        // when (操作):
        let outcome = membership.attach(identity("alice", "r1"), ());

        // then (期待する結果):
        assert!(outcome.first_connection);
        assert!(outcome.announces_join());
        assert_eq!(membership.connection_count(&room("r1")), 1);
    }

    #[test]
    fn test_attach_second_tab_is_not_first_connection() {
        // テスト項目: 同じユーザーの2つ目の接続（別タブ）は join にならない
        // given (前提条件):
        let mut membership = RoomMembership::new();
        membership.attach(identity("alice", "r1"), ());

        // when (操作):
        let outcome = membership.attach(identity("alice", "r1"), ());

        // then (期待する結果):
        assert!(!outcome.first_connection);
        assert!(!outcome.announces_join());
        assert_eq!(membership.connection_count(&room("r1")), 2);
        assert_eq!(membership.user_list(&room("r1")).len(), 1);
    }

    #[test]
    fn test_same_user_in_other_room_is_first_connection() {
        // テスト項目: 別の Room への接続はその Room での最初の接続になる
        // given (前提条件):
        let mut membership = RoomMembership::new();
        membership.attach(identity("alice", "r1"), ());

        // when (操作):
        let outcome = membership.attach(identity("alice", "r2"), ());

        // then (期待する結果):
        assert!(outcome.announces_join());
        assert_eq!(membership.room_count(), 2);
    }

    #[test]
    fn test_detach_last_connection_records_pending_leave_and_removes_room() {
        // テスト項目: 最後の接続を外すと pending leave が作られ、空の Room は削除される
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let alice = identity("alice", "r1");
        membership.attach(alice.clone(), ());

        // when (操作):
        let (member, departure) = membership
            .detach(&alice.room_id, &alice.connection_id)
            .unwrap();

        // then (期待する結果):
        assert_eq!(member.identity, alice);
        let key = PresenceKey::of(&alice);
        assert!(matches!(departure, Departure::Pending { key: ref k, .. } if *k == key));
        assert!(membership.is_leave_pending(&key));
        assert_eq!(membership.room_count(), 0);
        assert!(membership.presence(&room("r1")).is_none());
    }

    #[test]
    fn test_detach_with_remaining_tab_keeps_user_present() {
        // テスト項目: 他の接続が残っている場合、ユーザーは在室のまま
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let tab1 = identity("alice", "r1");
        let tab2 = identity("alice", "r1");
        membership.attach(tab1.clone(), ());
        membership.attach(tab2.clone(), ());

        // when (操作):
        let (_, departure) = membership
            .detach(&tab1.room_id, &tab1.connection_id)
            .unwrap();

        // then (期待する結果):
        assert_eq!(departure, Departure::StillPresent);
        assert!(!membership.is_leave_pending(&PresenceKey::of(&tab1)));
        assert!(membership.contains(&tab2.room_id, &tab2.connection_id));
        assert_eq!(membership.user_list(&room("r1")).len(), 1);
    }

    #[test]
    fn test_detach_unknown_connection_is_noop() {
        // テスト項目: 存在しない接続の detach は None を返す（冪等性）
        // given (前提条件):
        let mut membership: RoomMembership<()> = RoomMembership::new();
        let alice = identity("alice", "r1");

        // when (操作):
        let result = membership.detach(&alice.room_id, &alice.connection_id);

        // then (期待する結果):
        assert!(result.is_none());
        assert!(!membership.is_leave_pending(&PresenceKey::of(&alice)));
    }

    #[test]
    fn test_reconnect_within_grace_cancels_pending_leave() {
        // テスト項目: pending leave 中の再接続は leave をキャンセルし join も発生しない
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let first = identity("alice", "r1");
        membership.attach(first.clone(), ());
        membership.detach(&first.room_id, &first.connection_id);

        // when (操作):
        let outcome = membership.attach(identity("alice", "r1"), ());

        // then (期待する結果):
        assert!(outcome.first_connection);
        assert!(outcome.cancelled_leave.is_some());
        assert!(!outcome.announces_join());
        assert!(!membership.is_leave_pending(&PresenceKey::of(&first)));
    }

    #[test]
    fn test_finalize_leave_rejects_stale_generation() {
        // テスト項目: 古い generation の leave は確定されない（二重発火しない）
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let first = identity("alice", "r1");
        membership.attach(first.clone(), ());
        let (_, departure) = membership
            .detach(&first.room_id, &first.connection_id)
            .unwrap();
        let Departure::Pending { key, pending: stale } = departure else {
            panic!("expected pending leave");
        };

        // 再接続してすぐ切断 → 新しい pending leave
        let second = identity("alice", "r1");
        membership.attach(second.clone(), ());
        let (_, departure) = membership
            .detach(&second.room_id, &second.connection_id)
            .unwrap();
        let Departure::Pending { pending: current, .. } = departure else {
            panic!("expected pending leave");
        };

        // when (操作):
        let stale_result = membership.finalize_leave(&key, stale.generation);
        let current_result = membership.finalize_leave(&key, current.generation);

        // then (期待する結果):
        assert!(stale_result.is_none());
        assert_eq!(current_result, Some(current));
        assert!(!membership.is_leave_pending(&key));
    }

    #[test]
    fn test_recipients_excludes_all_connections_of_user() {
        // テスト項目: 除外ユーザーの全接続が配信対象から外れる
        // given (前提条件):
        let mut membership = RoomMembership::new();
        membership.attach(identity("alice", "r1"), ());
        membership.attach(identity("alice", "r1"), ());
        membership.attach(identity("bob", "r1"), ());
        membership.attach(identity("charlie", "r2"), ());

        // when (操作):
        let targets = membership.recipients(&room("r1"), Some(&user("alice")));
        let everyone = membership.recipients(&room("r1"), None);

        // then (期待する結果):
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].identity.user_id, user("bob"));
        assert_eq!(everyone.len(), 3);
    }

    #[test]
    fn test_recipients_of_unknown_room_is_empty() {
        // テスト項目: 存在しない Room の配信対象は空
        // given (前提条件):
        let membership: RoomMembership<()> = RoomMembership::new();

        // when (操作):
        let targets = membership.recipients(&room("nowhere"), None);

        // then (期待する結果):
        assert!(targets.is_empty());
    }

    #[test]
    fn test_user_list_lists_each_user_once_sorted() {
        // テスト項目: user_list はユーザーごとに1件、user_id 順で返される
        // given (前提条件):
        let mut membership = RoomMembership::new();
        membership.attach(identity("charlie", "r1"), ());
        membership.attach(identity("alice", "r1"), ());
        membership.attach(identity("alice", "r1"), ());
        membership.attach(identity("bob", "r1"), ());

        // when (操作):
        let users = membership.user_list(&room("r1"));

        // then (期待する結果):
        let ids: Vec<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "charlie"]);
        assert_eq!(users[0].username.as_str(), "alice-name");
    }

    #[test]
    fn test_membership_tracks_register_minus_unregister() {
        // テスト項目: メンバー集合は常に「登録 − 登録解除」と一致する
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let connections: Vec<ConnectionIdentity> =
            ["alice", "bob", "alice", "charlie", "bob"]
                .iter()
                .map(|u| identity(u, "r1"))
                .collect();

        // when (操作):
        for connection in &connections {
            membership.attach(connection.clone(), ());
        }
        membership.detach(&connections[1].room_id, &connections[1].connection_id);
        membership.detach(&connections[2].room_id, &connections[2].connection_id);

        // then (期待する結果):
        assert_eq!(membership.connection_count(&room("r1")), 3);
        for (index, connection) in connections.iter().enumerate() {
            let expected = index != 1 && index != 2;
            assert_eq!(
                membership.contains(&connection.room_id, &connection.connection_id),
                expected
            );
        }
        let ids: Vec<String> = membership
            .user_list(&room("r1"))
            .into_iter()
            .map(|u| u.user_id.into_string())
            .collect();
        assert_eq!(ids, vec!["alice", "bob", "charlie"]);
    }

    #[test]
    fn test_all_presence_sorted_by_room_id() {
        // テスト項目: 全 Room の在室状況が room_id 順で返される
        // given (前提条件):
        let mut membership = RoomMembership::new();
        membership.attach(identity("alice", "zeta"), ());
        membership.attach(identity("bob", "alpha"), ());
        membership.attach(identity("bob", "alpha"), ());

        // when (操作):
        let rooms = membership.all_presence();

        // then (期待する結果):
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].room_id.as_str(), "alpha");
        assert_eq!(rooms[0].connection_count, 2);
        assert_eq!(rooms[0].users.len(), 1);
        assert_eq!(rooms[1].room_id.as_str(), "zeta");
    }

    #[test]
    fn test_drain_clears_everything() {
        // テスト項目: drain で全メンバーと pending leave が取り除かれる
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let alice = identity("alice", "r1");
        membership.attach(alice.clone(), ());
        membership.attach(identity("bob", "r2"), ());
        let gone = identity("charlie", "r1");
        membership.attach(gone.clone(), ());
        membership.detach(&gone.room_id, &gone.connection_id);

        // when (操作):
        let drained = membership.drain();

        // then (期待する結果):
        assert_eq!(drained.len(), 2);
        assert_eq!(membership.room_count(), 0);
        assert!(!membership.is_leave_pending(&PresenceKey::of(&gone)));
    }
}
