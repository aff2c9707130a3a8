//! Account endpoints: registration, login, and user search.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::jwt;
use crate::db::models::{User, UserPublic};
use crate::error::ApiError;
use crate::state::AppState;

// --- Request types ---

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct FindQuery {
    pub name: Option<String>,
}

// --- Handlers ---

/// POST /auth/register
/// Create an account and hand back a session token right away. A taken
/// email is a conflict.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = body.email.trim().to_string();
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::validation("email and password required"));
    }

    // bcrypt is deliberately slow, keep it off the async runtime
    let password = body.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await?
        .map_err(ApiError::internal)?;

    let db = state.db.clone();
    let stored_email = email.clone();
    let stored_name = name.clone();
    let user_id = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;

        let exists: bool = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1",
            rusqlite::params![stored_email],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )?;
        if exists {
            return Err(ApiError::Conflict("email exists".to_string()));
        }

        let created_at = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO users (email, password_hash, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![stored_email, password_hash, stored_name, created_at],
        )?;

        Ok::<_, ApiError>(conn.last_insert_rowid())
    })
    .await??;

    let token = jwt::issue_token(&state.jwt_secret, user_id, &email, name.as_deref())
        .map_err(ApiError::internal)?;

    tracing::info!(user_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "user": UserPublic { id: user_id, email, name },
        })),
    ))
}

/// POST /auth/login
/// Unknown email and wrong password produce the same response.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = body.email.trim().to_string();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::validation("email and password required"));
    }

    let db = state.db.clone();
    let lookup_email = email.clone();
    let user = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;

        let user = conn
            .query_row(
                "SELECT id, email, password_hash, name, created_at FROM users WHERE email = ?1",
                rusqlite::params![lookup_email],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        password_hash: row.get(2)?,
                        name: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok::<_, ApiError>(user)
    })
    .await??;

    let user = match user {
        Some(user) => user,
        None => return Err(ApiError::Unauthorized),
    };

    let password = body.password.clone();
    let password_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await?
        .map_err(ApiError::internal)?;
    if !verified {
        return Err(ApiError::Unauthorized);
    }

    let token = jwt::issue_token(&state.jwt_secret, user.id, &user.email, user.name.as_deref())
        .map_err(ApiError::internal)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(json!({ "token": token, "user": user.public() })))
}

/// GET /auth/find?name=..
/// Substring search over names and emails, first ten matches.
pub async fn find_users(
    State(state): State<AppState>,
    Query(query): Query<FindQuery>,
) -> Result<Json<Value>, ApiError> {
    let q = query.name.unwrap_or_default().trim().to_string();
    if q.is_empty() {
        return Err(ApiError::validation("name required"));
    }

    let db = state.db.clone();
    let users = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(ApiError::internal)?;

        let pattern = format!("%{}%", q);
        let mut stmt = conn.prepare(
            "SELECT id, email, name FROM users WHERE name LIKE ?1 OR email LIKE ?1 LIMIT 10",
        )?;
        let users = stmt
            .query_map(rusqlite::params![pattern], |row| {
                Ok(UserPublic {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok::<_, ApiError>(users)
    })
    .await??;

    Ok(Json(json!({ "users": users })))
}
