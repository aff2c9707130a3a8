//! SQL over the message log. Every function borrows the connection;
//! callers hold the pool lock inside spawn_blocking and pass it down.

use rusqlite::{params, Connection};

use crate::db::models::{Conversation, StoredMessage};

/// Insert an event-room message, returning the new row id.
pub fn insert_event_message(
    conn: &Connection,
    sender_id: i64,
    event_id: i64,
    content: &str,
    created_at: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO messages (sender_id, event_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![sender_id, event_id, content, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a private message, returning the new row id.
pub fn insert_private_message(
    conn: &Connection,
    sender_id: i64,
    recipient_id: i64,
    content: &str,
    created_at: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO messages (sender_id, recipient_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![sender_id, recipient_id, content, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Full history of an event room, oldest first, sender names joined in.
pub fn event_history(conn: &Connection, event_id: i64) -> rusqlite::Result<Vec<StoredMessage>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.sender_id, m.event_id, m.recipient_id, m.content, m.created_at, u.name
         FROM messages m
         JOIN users u ON u.id = m.sender_id
         WHERE m.event_id = ?1
         ORDER BY m.created_at ASC, m.id ASC",
    )?;
    let rows = stmt.query_map(params![event_id], |row| map_message(row))?;
    rows.collect()
}

/// Messages between two users, both directions, oldest first.
pub fn private_history(
    conn: &Connection,
    user_a: i64,
    user_b: i64,
) -> rusqlite::Result<Vec<StoredMessage>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.sender_id, m.event_id, m.recipient_id, m.content, m.created_at, u.name
         FROM messages m
         JOIN users u ON u.id = m.sender_id
         WHERE (m.sender_id = ?1 AND m.recipient_id = ?2)
            OR (m.sender_id = ?2 AND m.recipient_id = ?1)
         ORDER BY m.created_at ASC, m.id ASC",
    )?;
    let rows = stmt.query_map(params![user_a, user_b], |row| map_message(row))?;
    rows.collect()
}

/// Most recent private message per distinct counterpart of `user_id`,
/// newest conversation first. Ties within a second resolve by MAX(id),
/// so the later insert wins.
pub fn conversations_for(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Conversation>> {
    let mut stmt = conn.prepare(
        "SELECT t.other_id, u.name AS other_name, m.content, m.created_at, m.sender_id FROM (
             SELECT CASE WHEN sender_id = ?1 THEN recipient_id ELSE sender_id END AS other_id,
                    MAX(id) AS last_id
             FROM messages
             WHERE (sender_id = ?1 OR recipient_id = ?1) AND recipient_id IS NOT NULL
             GROUP BY other_id
         ) t
         JOIN messages m ON m.id = t.last_id
         JOIN users u ON u.id = t.other_id
         ORDER BY m.created_at DESC",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(Conversation {
            other_id: row.get(0)?,
            other_name: row.get(1)?,
            content: row.get(2)?,
            created_at: row.get(3)?,
            sender_id: row.get(4)?,
        })
    })?;
    rows.collect()
}

/// True if a user row exists.
pub fn user_exists(conn: &Connection, user_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM users WHERE id = ?1",
        params![user_id],
        |row| row.get::<_, i64>(0).map(|count| count > 0),
    )
}

/// True if an event row exists.
pub fn event_exists(conn: &Connection, event_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM events WHERE id = ?1",
        params![event_id],
        |row| row.get::<_, i64>(0).map(|count| count > 0),
    )
}

fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        event_id: row.get(2)?,
        recipient_id: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        sender_name: row.get(6)?,
    })
}
