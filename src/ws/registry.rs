use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::rooms::Room;

/// Identifier for one WebSocket connection. A user with several tabs
/// open holds several connection ids.
pub type ConnectionId = Uuid;

/// Sender half of a connection's outbound queue. Cloning is cheap; the
/// actor's writer task drains the receiving end.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// Tracks which connections are in which rooms.
///
/// Membership is in-memory only and dies with the connection. The two
/// maps are kept in sync: `rooms` answers "who receives this broadcast",
/// `joined` answers "which rooms does this connection leave on
/// disconnect" without scanning every room.
#[derive(Default)]
pub struct PresenceRegistry {
    rooms: DashMap<Room, HashMap<ConnectionId, ConnectionSender>>,
    joined: DashMap<ConnectionId, HashSet<Room>>,
}

impl PresenceRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add a connection to a room. Joining a room twice is a no-op.
    pub fn join(&self, conn_id: ConnectionId, sender: ConnectionSender, room: Room) {
        self.rooms.entry(room).or_default().insert(conn_id, sender);
        self.joined.entry(conn_id).or_default().insert(room);
        tracing::debug!(connection = %conn_id, room = %room, "Joined room");
    }

    /// Remove a connection from a room. Leaving a room it never joined
    /// is a no-op. Empty rooms are dropped from the map.
    pub fn leave(&self, conn_id: ConnectionId, room: Room) {
        let mut now_empty = false;
        if let Some(mut members) = self.rooms.get_mut(&room) {
            members.remove(&conn_id);
            now_empty = members.is_empty();
        }
        if now_empty {
            self.rooms.remove_if(&room, |_, members| members.is_empty());
        }
        if let Some(mut joined) = self.joined.get_mut(&conn_id) {
            joined.remove(&room);
        }
        tracing::debug!(connection = %conn_id, room = %room, "Left room");
    }

    /// Snapshot of the current members of a room.
    pub fn members_of(&self, room: Room) -> Vec<(ConnectionId, ConnectionSender)> {
        self.rooms
            .get(&room)
            .map(|members| {
                members
                    .iter()
                    .map(|(id, sender)| (*id, sender.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove a connection from every room it joined. Called from the
    /// actor's exit path, so an abrupt disconnect cleans up the same way
    /// an explicit leave does.
    pub fn on_disconnect(&self, conn_id: ConnectionId) {
        let rooms = self
            .joined
            .remove(&conn_id)
            .map(|(_, set)| set)
            .unwrap_or_default();

        for room in rooms {
            let mut now_empty = false;
            if let Some(mut members) = self.rooms.get_mut(&room) {
                members.remove(&conn_id);
                now_empty = members.is_empty();
            }
            if now_empty {
                self.rooms.remove_if(&room, |_, members| members.is_empty());
            }
        }

        tracing::debug!(connection = %conn_id, "Presence cleared");
    }
}
