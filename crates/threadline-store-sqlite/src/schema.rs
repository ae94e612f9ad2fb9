//! SQL schema for the Threadline SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Ownership is expressed with `ON DELETE CASCADE`: history rows and
/// notifications die with their message. The reply links between messages
/// carry no cascade; SQLite nests cascades like triggers and gives up past
/// `SQLITE_MAX_TRIGGER_DEPTH`, so reply chains are removed explicitly by the
/// cascade module in a single statement.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT,
    role        TEXT NOT NULL DEFAULT 'guest',   -- 'guest' | 'host' | 'admin'
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    message_id        TEXT PRIMARY KEY,
    sender_id         TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    receiver_id       TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    content           TEXT NOT NULL,
    timestamp         TEXT NOT NULL,   -- RFC 3339 UTC, fixed width; server-assigned
    parent_message_id TEXT REFERENCES messages(message_id),
    thread_root_id    TEXT REFERENCES messages(message_id),
    is_edited         INTEGER NOT NULL DEFAULT 0,
    is_read           INTEGER NOT NULL DEFAULT 0
);

-- Append-only; no UPDATE is ever issued against this table.
CREATE TABLE IF NOT EXISTS message_history (
    history_id  TEXT PRIMARY KEY,
    message_id  TEXT NOT NULL REFERENCES messages(message_id) ON DELETE CASCADE,
    old_content TEXT NOT NULL,
    editor_id   TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    edited_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id   TEXT PRIMARY KEY,
    user_id           TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    message_id        TEXT NOT NULL REFERENCES messages(message_id) ON DELETE CASCADE,
    content           TEXT NOT NULL,
    notification_type TEXT NOT NULL CHECK (notification_type IN ('message', 'reply', 'edit')),
    is_read           INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL,
    parent_message_id TEXT REFERENCES messages(message_id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS messages_thread_root_idx ON messages(thread_root_id);
CREATE INDEX IF NOT EXISTS messages_parent_idx      ON messages(parent_message_id);
CREATE INDEX IF NOT EXISTS messages_sender_idx      ON messages(sender_id, timestamp);
CREATE INDEX IF NOT EXISTS messages_timestamp_idx   ON messages(timestamp);
CREATE INDEX IF NOT EXISTS messages_receiver_idx    ON messages(receiver_id, is_read);
CREATE INDEX IF NOT EXISTS history_message_idx      ON message_history(message_id);
CREATE INDEX IF NOT EXISTS history_editor_idx       ON message_history(editor_id);
CREATE INDEX IF NOT EXISTS notifications_user_idx   ON notifications(user_id, created_at);
CREATE INDEX IF NOT EXISTS notifications_message_idx ON notifications(message_id);
CREATE INDEX IF NOT EXISTS notifications_parent_idx ON notifications(parent_message_id);

PRAGMA user_version = 1;
";
