//! REST endpoints for private chat: pairwise history and the
//! conversation listing.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::auth::middleware::Claims;
use crate::chat::store;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /chat/private/{user_a}/{user_b}
/// Messages between two users, both directions, oldest first.
pub async fn private_history(
    State(state): State<AppState>,
    Path((user_a, user_b)): Path<(i64, i64)>,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.clone();

    let messages = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;
        Ok::<_, ApiError>(store::private_history(&conn, user_a, user_b)?)
    })
    .await??;

    Ok(Json(json!({ "messages": messages })))
}

/// GET /chat/conversations
/// One entry per private counterpart of the caller: the most recent
/// message exchanged with each, newest first. JWT auth required.
pub async fn list_conversations(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.clone();
    let user_id = claims.sub;

    let conversations = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;
        Ok::<_, ApiError>(store::conversations_for(&conn, user_id)?)
    })
    .await??;

    Ok(Json(json!({ "conversations": conversations })))
}
