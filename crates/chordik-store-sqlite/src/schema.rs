//! SQL schema for the Chordik SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    display_name  TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,        -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS songs (
    song_id    TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL REFERENCES users(user_id),
    title      TEXT NOT NULL,
    artist     TEXT NOT NULL,
    body       TEXT NOT NULL,           -- ChordPro
    key        TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- One vote per (song, user). A removed vote is a deleted row, never a zero.
CREATE TABLE IF NOT EXISTS votes (
    vote_id    TEXT PRIMARY KEY,
    song_id    TEXT NOT NULL REFERENCES songs(song_id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    value      INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (song_id, user_id),
    CHECK  (value IN (-1, 1))
);

CREATE TABLE IF NOT EXISTS badges (
    badge_id    TEXT PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    description TEXT NOT NULL
);

-- Awards are permanent: no UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS user_badges (
    user_badge_id TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL REFERENCES users(user_id),
    badge_id      TEXT NOT NULL REFERENCES badges(badge_id),
    awarded_at    TEXT NOT NULL,
    UNIQUE (user_id, badge_id)
);

CREATE INDEX IF NOT EXISTS songs_owner_idx   ON songs(owner_id);
CREATE INDEX IF NOT EXISTS songs_created_idx ON songs(created_at);

PRAGMA user_version = 1;
";
