//! REST endpoints for event discovery and lifecycle.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::middleware::Claims;
use crate::db::models::Event;
use crate::error::ApiError;
use crate::events::geo;
use crate::state::AppState;
use crate::ws::rooms::Room;

/// Default search radius when the client sends none.
const DEFAULT_RADIUS_KM: f64 = 10.0;

// --- Request / Response types ---

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Event row plus its organizer's public identity, as listed and fetched.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub organizer_name: Option<String>,
    pub organizer_email: String,
}

// --- Handlers ---

/// GET /events?lat=..&lng=..&radius=..
/// Events inside the rectangular window around the given point, soonest
/// first. Missing parameters fall back to the origin and a 10 km radius.
pub async fn list_nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Value>, ApiError> {
    let lat = query.lat.unwrap_or(0.0);
    let lng = query.lng.unwrap_or(0.0);
    let radius_km = query.radius.unwrap_or(DEFAULT_RADIUS_KM);
    let bounds = geo::bounding_box(lat, lng, radius_km);

    let db = state.db.clone();
    let events = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;

        let mut stmt = conn.prepare(
            "SELECT e.id, e.title, e.description, e.start_time, e.lat, e.lng,
                    e.organizer_id, e.created_at, u.name, u.email
             FROM events e
             JOIN users u ON u.id = e.organizer_id
             WHERE e.lat BETWEEN ?1 AND ?2 AND e.lng BETWEEN ?3 AND ?4
             ORDER BY e.start_time ASC",
        )?;
        let events = stmt
            .query_map(
                rusqlite::params![bounds.min_lat, bounds.max_lat, bounds.min_lng, bounds.max_lng],
                |row| map_event_with_organizer(row),
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok::<_, ApiError>(events)
    })
    .await??;

    Ok(Json(json!({ "events": events })))
}

/// GET /events/mine
/// Events organized by the caller, newest start first. JWT auth required.
pub async fn list_mine(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.clone();
    let organizer_id = claims.sub;

    let events = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;

        let mut stmt = conn.prepare(
            "SELECT id, title, description, start_time, lat, lng, organizer_id, created_at
             FROM events WHERE organizer_id = ?1 ORDER BY start_time DESC",
        )?;
        let events = stmt
            .query_map(rusqlite::params![organizer_id], |row| {
                Ok(Event {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    start_time: row.get(3)?,
                    lat: row.get(4)?,
                    lng: row.get(5)?,
                    organizer_id: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok::<_, ApiError>(events)
    })
    .await??;

    Ok(Json(json!({ "events": events })))
}

/// GET /events/{id}
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.clone();

    let event = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;

        let result = conn.query_row(
            "SELECT e.id, e.title, e.description, e.start_time, e.lat, e.lng,
                    e.organizer_id, e.created_at, u.name, u.email
             FROM events e
             JOIN users u ON u.id = e.organizer_id
             WHERE e.id = ?1",
            rusqlite::params![event_id],
            |row| map_event_with_organizer(row),
        );

        match result {
            Ok(event) => Ok(event),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(ApiError::NotFound("event")),
            Err(e) => Err(e.into()),
        }
    })
    .await??;

    Ok(Json(json!({ "event": event })))
}

/// POST /events
/// Create an event with the caller as organizer. JWT auth required.
pub async fn create_event(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let CreateEventRequest {
        title,
        description,
        start_time,
        lat,
        lng,
    } = body;

    let title = title.trim().to_string();
    let start_time = start_time.trim().to_string();
    let (lat, lng) = match (lat, lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return Err(ApiError::validation("missing fields")),
    };
    if title.is_empty() || start_time.is_empty() {
        return Err(ApiError::validation("missing fields"));
    }

    let db = state.db.clone();
    let organizer_id = claims.sub;
    let created_at = Utc::now().to_rfc3339();

    let event_id = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;

        conn.execute(
            "INSERT INTO events (title, description, start_time, lat, lng, organizer_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![title, description, start_time, lat, lng, organizer_id, created_at],
        )?;

        Ok::<_, ApiError>(conn.last_insert_rowid())
    })
    .await??;

    tracing::info!(event_id, organizer_id, "Event created");

    Ok((StatusCode::CREATED, Json(json!({ "id": event_id }))))
}

/// DELETE /events/{id}
/// Organizer-only. Participations and messages cascade with the event
/// row; members still in the room are told it is gone.
pub async fn delete_event(
    State(state): State<AppState>,
    claims: Claims,
    Path(event_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.clone();
    let user_id = claims.sub;

    tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;

        let organizer_id: i64 = match conn.query_row(
            "SELECT organizer_id FROM events WHERE id = ?1",
            rusqlite::params![event_id],
            |row| row.get(0),
        ) {
            Ok(id) => id,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Err(ApiError::NotFound("event")),
            Err(e) => return Err(e.into()),
        };

        if organizer_id != user_id {
            return Err(ApiError::Forbidden);
        }

        conn.execute(
            "DELETE FROM events WHERE id = ?1",
            rusqlite::params![event_id],
        )?;

        Ok(())
    })
    .await??;

    state
        .relay
        .publish(Room::Event(event_id), "eventDeleted", json!({ "eventId": event_id }));

    tracing::info!(event_id, user_id, "Event deleted");

    Ok(Json(json!({ "ok": true })))
}

fn map_event_with_organizer(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventResponse> {
    Ok(EventResponse {
        event: Event {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            start_time: row.get(3)?,
            lat: row.get(4)?,
            lng: row.get(5)?,
            organizer_id: row.get(6)?,
            created_at: row.get(7)?,
        },
        organizer_name: row.get(8)?,
        organizer_email: row.get(9)?,
    })
}
