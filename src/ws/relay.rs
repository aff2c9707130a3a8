use axum::extract::ws::Message;
use serde_json::Value;
use std::sync::Arc;

use crate::ws::registry::PresenceRegistry;
use crate::ws::rooms::Room;

/// Fans application events out to the members of a room.
///
/// Delivery is best-effort: the frame is serialized once and enqueued on
/// each member's outbound queue, and the call returns as soon as every
/// enqueue has been attempted. A member whose queue is gone gets logged
/// and evicted; one dead connection never blocks the rest, and nothing
/// is retried.
#[derive(Clone)]
pub struct Relay {
    registry: Arc<PresenceRegistry>,
}

impl Relay {
    pub fn new(registry: Arc<PresenceRegistry>) -> Self {
        Self { registry }
    }

    /// Broadcast `{"event": <event>, "data": <data>}` to every member of `room`.
    pub fn publish(&self, room: Room, event: &str, data: Value) {
        let frame = serde_json::json!({ "event": event, "data": data });
        let msg = Message::Text(frame.to_string().into());

        let members = self.registry.members_of(room);
        let mut delivered = 0usize;
        for (conn_id, sender) in members {
            if sender.send(msg.clone()).is_ok() {
                delivered += 1;
            } else {
                // Receiver dropped before the actor's cleanup ran
                tracing::warn!(
                    connection = %conn_id,
                    room = %room,
                    event = %event,
                    "Delivery failed, evicting member"
                );
                self.registry.leave(conn_id, room);
            }
        }

        tracing::debug!(room = %room, event = %event, delivered, "Broadcast published");
    }
}
