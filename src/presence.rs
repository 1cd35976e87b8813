//! Presence Tracker
//!
//! The roster of a room is read straight from its member set; nothing is
//! stored on the side, so presence cannot drift from the live sessions.

use std::sync::Arc;

use crate::error::{SyncError, SyncResult};
use crate::protocol::ServerEvent;
use crate::relay::RelayEngine;
use crate::room::{Member, Room, RoomRegistry, RoomState};

/// Maintains per-room membership and emits join/leave notifications
#[derive(Clone)]
pub struct PresenceTracker {
    registry: Arc<RoomRegistry>,
}

impl PresenceTracker {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Add a member to a room, creating the room if needed
    pub fn member_joined(&self, room_id: &str, member: Member) {
        self.registry
            .attach(room_id, |room, state| Self::record_join(room, state, member));
    }

    /// Remove a member; discards the room if it becomes empty
    ///
    /// Returns the removed member, or `None` if the room or session was unknown.
    pub fn member_left(&self, room_id: &str, session_id: &str) -> Option<Member> {
        self.registry
            .detach(room_id, |room, state| Self::record_leave(room, state, session_id))
            .flatten()
    }

    /// Usernames currently in the room, in join order
    pub fn members(&self, room_id: &str) -> SyncResult<Vec<String>> {
        self.registry
            .room(room_id)
            .map(|room| room.usernames())
            .ok_or_else(|| SyncError::RoomNotFound(room_id.to_string()))
    }

    /// Insert `member` and notify the room; caller holds the room lock
    ///
    /// `member_joined` goes to everyone else, `presence_update` to everyone
    /// including the newcomer.
    pub(crate) fn record_join(room: &Room, state: &mut RoomState, member: Member) {
        let username = member.username.clone();
        let session_id = member.session_id.clone();
        state.members.push(member);

        RelayEngine::publish(
            room,
            state,
            ServerEvent::MemberJoined { username },
            Some(&session_id),
        );
        Self::publish_roster(room, state);
    }

    /// Remove a member and notify the remaining ones; caller holds the room lock
    pub(crate) fn record_leave(
        room: &Room,
        state: &mut RoomState,
        session_id: &str,
    ) -> Option<Member> {
        let index = state
            .members
            .iter()
            .position(|m| m.session_id == session_id)?;
        let member = state.members.remove(index);
        member.deactivate();

        RelayEngine::publish(
            room,
            state,
            ServerEvent::MemberLeft {
                username: member.username.clone(),
            },
            Some(session_id),
        );
        Self::publish_roster(room, state);
        Some(member)
    }

    fn publish_roster(room: &Room, state: &mut RoomState) {
        let members = state.usernames();
        RelayEngine::publish(room, state, ServerEvent::PresenceUpdate { members }, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> (Arc<RoomRegistry>, PresenceTracker) {
        let registry = Arc::new(RoomRegistry::new());
        let presence = PresenceTracker::new(Arc::clone(&registry));
        (registry, presence)
    }

    #[test]
    fn test_members_in_join_order() {
        let (_, presence) = tracker();
        presence.member_joined("r1", Member::new("s1".into(), "alice".into()));
        presence.member_joined("r1", Member::new("s2".into(), "bob".into()));

        assert_eq!(presence.members("r1").unwrap(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_leave_updates_roster_and_discards_empty_room() {
        let (registry, presence) = tracker();
        presence.member_joined("r1", Member::new("s1".into(), "alice".into()));
        presence.member_joined("r1", Member::new("s2".into(), "bob".into()));

        let left = presence.member_left("r1", "s1").unwrap();
        assert_eq!(left.username, "alice");
        assert_eq!(presence.members("r1").unwrap(), vec!["bob"]);

        presence.member_left("r1", "s2");
        assert!(!registry.room_exists("r1"));
        assert!(matches!(presence.members("r1"), Err(SyncError::RoomNotFound(_))));
    }

    #[test]
    fn test_unknown_member_left_is_noop() {
        let (registry, presence) = tracker();
        presence.member_joined("r1", Member::new("s1".into(), "alice".into()));

        assert!(presence.member_left("r1", "nobody").is_none());
        assert!(presence.member_left("nowhere", "s1").is_none());
        assert!(registry.room_exists("r1"));
    }

    #[test]
    fn test_join_notifications() {
        let (registry, presence) = tracker();
        let room = registry.get_or_create_room("r1");
        let mut rx = room.subscribe();

        presence.member_joined("r1", Member::new("s1".into(), "alice".into()));

        let joined = rx.try_recv().unwrap();
        assert_eq!(joined.origin.as_deref(), Some("s1"));
        assert_eq!(
            joined.message.event,
            ServerEvent::MemberJoined { username: "alice".into() }
        );

        let roster = rx.try_recv().unwrap();
        assert!(roster.origin.is_none());
        assert_eq!(
            roster.message.event,
            ServerEvent::PresenceUpdate { members: vec!["alice".into()] }
        );
    }
}
