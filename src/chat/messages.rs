//! REST endpoints for event-room chat: history and message submission.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::middleware::Claims;
use crate::chat::ingress::{self, ChatSubmission};
use crate::chat::store;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub content: String,
}

// --- Handlers ---

/// GET /chat/event/{event_id}/messages
/// Full room history, oldest first, sender names joined in.
pub async fn event_history(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.clone();

    let messages = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;
        Ok::<_, ApiError>(store::event_history(&conn, event_id)?)
    })
    .await??;

    Ok(Json(json!({ "messages": messages })))
}

/// POST /chat/event/{event_id}/messages
/// Submit a room message over REST. JWT auth required; the sender is the
/// token holder. Runs the same pipeline as the socket path, so the room
/// broadcast happens on this path too.
pub async fn create_event_message(
    State(state): State<AppState>,
    claims: Claims,
    Path(event_id): Path<i64>,
    Json(body): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let accepted = ingress::submit(
        &state,
        ChatSubmission::Event {
            event_id,
            sender_id: claims.sub,
            sender_name: Some(claims.display_name()),
            content: body.content,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": accepted.message_id }))))
}
