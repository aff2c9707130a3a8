//! Database row types for all tables.
//! These correspond 1:1 to the SQLite schema defined in migrations.rs.

use serde::Serialize;

/// User record in the users table.
/// Never serialized directly, the password hash stays server-side.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub created_at: String,
}

impl User {
    /// Public projection safe to return to clients.
    pub fn public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Client-facing user projection (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}

/// Event record in the events table. Serialized as-is in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: String,
    pub lat: f64,
    pub lng: f64,
    pub organizer_id: i64,
    pub created_at: String,
}

/// Message row as returned by history queries (sender name joined in).
/// Exactly one of `event_id` / `recipient_id` is set.
#[derive(Debug, Clone, Serialize)]
pub struct StoredMessage {
    pub id: i64,
    pub sender_id: i64,
    pub event_id: Option<i64>,
    pub recipient_id: Option<i64>,
    pub content: String,
    pub created_at: String,
    pub sender_name: Option<String>,
}

/// One entry in a user's conversation listing: the counterpart plus the
/// most recent message exchanged with them.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub other_id: i64,
    pub other_name: Option<String>,
    pub content: String,
    pub created_at: String,
    pub sender_id: i64,
}
