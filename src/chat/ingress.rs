//! Canonical submission pipeline for chat messages.
//!
//! Both entry points (real-time frames and the REST endpoint) build a
//! [`ChatSubmission`] and call [`submit`]. The pipeline persists before
//! it broadcasts: a message that was never written is never announced.
//! Broadcast failures stay inside the relay.

use chrono::Utc;
use serde_json::json;

use crate::chat::store;
use crate::error::ApiError;
use crate::state::AppState;
use crate::ws::rooms::Room;

/// A chat message on its way in, from either entry point.
///
/// `sender_name` is whatever display name the submitter attached; it is
/// echoed in broadcasts but never stored (history joins the users table
/// instead).
#[derive(Debug, Clone)]
pub enum ChatSubmission {
    Event {
        event_id: i64,
        sender_id: i64,
        sender_name: Option<String>,
        content: String,
    },
    Private {
        to_user_id: i64,
        sender_id: i64,
        sender_name: Option<String>,
        content: String,
    },
}

/// Outcome of an accepted submission.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub message_id: i64,
    pub created_at: String,
}

/// Validate, persist, then broadcast one submission.
pub async fn submit(state: &AppState, submission: ChatSubmission) -> Result<Accepted, ApiError> {
    let content = match &submission {
        ChatSubmission::Event { content, .. } | ChatSubmission::Private { content, .. } => {
            content.trim().to_string()
        }
    };
    if content.is_empty() {
        return Err(ApiError::validation("content required"));
    }

    let created_at = Utc::now().to_rfc3339();

    let db = state.db.clone();
    let sub = submission.clone();
    let stored_content = content.clone();
    let stored_at = created_at.clone();

    let message_id = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;

        match &sub {
            ChatSubmission::Event {
                event_id, sender_id, ..
            } => {
                if !store::user_exists(&conn, *sender_id)? {
                    return Err(ApiError::NotFound("sender"));
                }
                if !store::event_exists(&conn, *event_id)? {
                    return Err(ApiError::NotFound("event"));
                }
                Ok(store::insert_event_message(
                    &conn,
                    *sender_id,
                    *event_id,
                    &stored_content,
                    &stored_at,
                )?)
            }
            ChatSubmission::Private {
                to_user_id,
                sender_id,
                ..
            } => {
                if !store::user_exists(&conn, *sender_id)? {
                    return Err(ApiError::NotFound("sender"));
                }
                if !store::user_exists(&conn, *to_user_id)? {
                    return Err(ApiError::NotFound("recipient"));
                }
                Ok(store::insert_private_message(
                    &conn,
                    *sender_id,
                    *to_user_id,
                    &stored_content,
                    &stored_at,
                )?)
            }
        }
    })
    .await??;

    // The row is in, safe to fan out
    match submission {
        ChatSubmission::Event {
            event_id,
            sender_id,
            sender_name,
            ..
        } => {
            state.relay.publish(
                Room::Event(event_id),
                "newEventMessage",
                json!({
                    "eventId": event_id,
                    "senderId": sender_id,
                    "senderName": sender_name,
                    "content": content,
                }),
            );
        }
        ChatSubmission::Private {
            to_user_id,
            sender_id,
            sender_name,
            ..
        } => {
            state.relay.publish(
                Room::User(to_user_id),
                "newPrivateMessage",
                json!({
                    "toUserId": to_user_id,
                    "senderId": sender_id,
                    "senderName": sender_name,
                    "content": content,
                }),
            );
            state.relay.publish(
                Room::User(to_user_id),
                "notification",
                json!({
                    "type": "private",
                    "from": sender_id,
                    "fromName": sender_name,
                    "content": content,
                }),
            );
        }
    }

    Ok(Accepted {
        message_id,
        created_at,
    })
}
