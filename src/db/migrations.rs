use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Tracked through the SQLite user_version pragma, no migration table needed.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "-- Migration 1: Initial schema

CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    name TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    start_time TEXT NOT NULL,
    lat REAL NOT NULL,
    lng REAL NOT NULL,
    organizer_id INTEGER NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_events_location ON events(lat, lng);
CREATE INDEX idx_events_organizer ON events(organizer_id);

CREATE TABLE participations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(user_id, event_id)
);

CREATE INDEX idx_participations_event ON participations(event_id);

-- A message belongs to exactly one destination: an event room or a
-- private recipient. The CHECK makes the exclusive-or structural.
CREATE TABLE messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_id INTEGER NOT NULL REFERENCES users(id),
    event_id INTEGER REFERENCES events(id) ON DELETE CASCADE,
    recipient_id INTEGER REFERENCES users(id),
    content TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((event_id IS NULL) <> (recipient_id IS NULL))
);

CREATE INDEX idx_messages_event ON messages(event_id, created_at);
CREATE INDEX idx_messages_private ON messages(sender_id, recipient_id);
CREATE INDEX idx_messages_recipient ON messages(recipient_id);
",
    )])
}
