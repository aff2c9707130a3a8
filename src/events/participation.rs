//! Event participation: joining an event and listing who is going.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rusqlite::OptionalExtension;
use serde_json::{json, Value};

use crate::auth::middleware::Claims;
use crate::db::models::UserPublic;
use crate::error::ApiError;
use crate::state::AppState;
use crate::ws::rooms::Room;

// --- Handlers ---

/// POST /events/{id}/participate
/// Join an event. Joining twice is a conflict; the UNIQUE constraint on
/// (user_id, event_id) backs the explicit check. After the row is in,
/// the organizer's personal room gets a notification. JWT auth required.
pub async fn participate(
    State(state): State<AppState>,
    claims: Claims,
    Path(event_id): Path<i64>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let db = state.db.clone();
    let user_id = claims.sub;

    let (participation_id, organizer_id, participant_name) =
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().map_err(ApiError::internal)?;

            let organizer_id: i64 = match conn.query_row(
                "SELECT organizer_id FROM events WHERE id = ?1",
                rusqlite::params![event_id],
                |row| row.get(0),
            ) {
                Ok(id) => id,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Err(ApiError::NotFound("event"))
                }
                Err(e) => return Err(e.into()),
            };

            let already: bool = conn.query_row(
                "SELECT COUNT(*) FROM participations WHERE user_id = ?1 AND event_id = ?2",
                rusqlite::params![user_id, event_id],
                |row| row.get::<_, i64>(0).map(|count| count > 0),
            )?;
            if already {
                return Err(ApiError::Conflict("already participating".to_string()));
            }

            let created_at = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO participations (user_id, event_id, status, created_at)
                 VALUES (?1, ?2, 'pending', ?3)",
                rusqlite::params![user_id, event_id, created_at],
            )?;
            let participation_id = conn.last_insert_rowid();

            // Display name for the organizer notification
            let participant_name: Option<String> = conn
                .query_row(
                    "SELECT COALESCE(name, email) FROM users WHERE id = ?1",
                    rusqlite::params![user_id],
                    |row| row.get(0),
                )
                .ok();

            Ok((participation_id, organizer_id, participant_name))
        })
        .await??;

    state.relay.publish(
        Room::User(organizer_id),
        "notification",
        json!({
            "type": "participation",
            "eventId": event_id,
            "from": user_id,
            "fromName": participant_name,
        }),
    );

    tracing::info!(event_id, user_id, "Participation added");

    Ok((StatusCode::CREATED, Json(json!({ "id": participation_id }))))
}

/// GET /events/{id}/participants
/// Organizer plus everyone participating. An unknown event yields a null
/// organizer and an empty list rather than an error.
pub async fn list_participants(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.clone();

    let (organizer, participants) = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;

        let organizer: Option<UserPublic> = conn
            .query_row(
                "SELECT u.id, u.name, u.email
                 FROM events e JOIN users u ON u.id = e.organizer_id
                 WHERE e.id = ?1",
                rusqlite::params![event_id],
                |row| {
                    Ok(UserPublic {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;

        let mut stmt = conn.prepare(
            "SELECT u.id, u.name, u.email
             FROM participations p JOIN users u ON u.id = p.user_id
             WHERE p.event_id = ?1",
        )?;
        let participants = stmt
            .query_map(rusqlite::params![event_id], |row| {
                Ok(UserPublic {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok::<_, ApiError>((organizer, participants))
    })
    .await??;

    Ok(Json(json!({ "organizer": organizer, "participants": participants })))
}
