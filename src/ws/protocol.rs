//! Inbound frame handling for the real-time socket.
//!
//! Frames are JSON text of the form `{"event": "...", "data": ...}` in
//! both directions. Unknown events and malformed payloads are logged and
//! dropped; the socket path never reports errors back to the client.
//! Identity here is caller-asserted: `identify` and the `senderId`
//! fields are trusted as sent. Only the HTTP surface verifies tokens.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::chat::ingress::{self, ChatSubmission};
use crate::state::AppState;
use crate::ws::registry::{ConnectionId, ConnectionSender};
use crate::ws::rooms::Room;

/// Top-level inbound frame.
#[derive(Debug, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct IdentifyPayload {
    #[serde(rename = "userId", deserialize_with = "flexible_id")]
    user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventMessagePayload {
    #[serde(deserialize_with = "flexible_id")]
    event_id: i64,
    #[serde(deserialize_with = "flexible_id")]
    sender_id: i64,
    #[serde(default)]
    sender_name: Option<String>,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrivateMessagePayload {
    #[serde(deserialize_with = "flexible_id")]
    to_user_id: i64,
    #[serde(deserialize_with = "flexible_id")]
    sender_id: i64,
    #[serde(default)]
    sender_name: Option<String>,
    #[serde(default)]
    content: String,
}

/// Parse and dispatch one inbound text frame.
pub async fn handle_frame(
    text: &str,
    conn_id: ConnectionId,
    sender: &ConnectionSender,
    state: &AppState,
) {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(connection = %conn_id, error = %e, "Ignoring malformed frame");
            return;
        }
    };

    match frame.event.as_str() {
        "identify" => match serde_json::from_value::<IdentifyPayload>(frame.data) {
            Ok(payload) => {
                state
                    .registry
                    .join(conn_id, sender.clone(), Room::User(payload.user_id));
            }
            Err(e) => {
                tracing::debug!(connection = %conn_id, error = %e, "Bad identify payload");
            }
        },
        "joinEvent" => match parse_bare_id(&frame.data) {
            Some(event_id) => {
                state
                    .registry
                    .join(conn_id, sender.clone(), Room::Event(event_id));
            }
            None => {
                tracing::debug!(connection = %conn_id, "Bad joinEvent payload");
            }
        },
        "leaveEvent" => match parse_bare_id(&frame.data) {
            Some(event_id) => {
                state.registry.leave(conn_id, Room::Event(event_id));
            }
            None => {
                tracing::debug!(connection = %conn_id, "Bad leaveEvent payload");
            }
        },
        "eventMessage" => match serde_json::from_value::<EventMessagePayload>(frame.data) {
            Ok(payload) => {
                let submission = ChatSubmission::Event {
                    event_id: payload.event_id,
                    sender_id: payload.sender_id,
                    sender_name: payload.sender_name,
                    content: payload.content,
                };
                if let Err(e) = ingress::submit(state, submission).await {
                    tracing::warn!(connection = %conn_id, error = %e, "Event message rejected");
                }
            }
            Err(e) => {
                tracing::debug!(connection = %conn_id, error = %e, "Bad eventMessage payload");
            }
        },
        "privateMessage" => match serde_json::from_value::<PrivateMessagePayload>(frame.data) {
            Ok(payload) => {
                let submission = ChatSubmission::Private {
                    to_user_id: payload.to_user_id,
                    sender_id: payload.sender_id,
                    sender_name: payload.sender_name,
                    content: payload.content,
                };
                if let Err(e) = ingress::submit(state, submission).await {
                    tracing::warn!(connection = %conn_id, error = %e, "Private message rejected");
                }
            }
            Err(e) => {
                tracing::debug!(connection = %conn_id, error = %e, "Bad privateMessage payload");
            }
        },
        other => {
            tracing::debug!(connection = %conn_id, event = %other, "Unknown event, ignoring");
        }
    }
}

/// `joinEvent` / `leaveEvent` carry the event id bare, not wrapped in an
/// object, and browser clients send it as a number or a numeric string.
fn parse_bare_id(data: &Value) -> Option<i64> {
    match data {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Id fields arrive as JSON numbers or numeric strings depending on the
/// client (route params are strings). Accept both.
fn flexible_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl serde::de::Visitor<'_> for IdVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an integer id or a numeric string")
        }

        fn visit_i64<E>(self, v: i64) -> Result<i64, E>
        where
            E: serde::de::Error,
        {
            Ok(v)
        }

        fn visit_u64<E>(self, v: u64) -> Result<i64, E>
        where
            E: serde::de::Error,
        {
            i64::try_from(v).map_err(E::custom)
        }

        fn visit_str<E>(self, v: &str) -> Result<i64, E>
        where
            E: serde::de::Error,
        {
            v.trim().parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
