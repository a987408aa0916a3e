//! SQL schema for the Agora SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id                TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    first_name        TEXT NOT NULL,
    email             TEXT NOT NULL UNIQUE,   -- compared exactly, no COLLATE NOCASE
    country           TEXT NOT NULL,
    password_hash     TEXT NOT NULL,          -- argon2 PHC string
    verified          INTEGER NOT NULL DEFAULT 0,
    verification_code TEXT NOT NULL DEFAULT '',
    role              TEXT NOT NULL DEFAULT 'user',   -- 'user' | 'admin'
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

-- owner_id is written once on insert and never updated.
CREATE TABLE IF NOT EXISTS posts (
    id          TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES users(id),
    content     TEXT NOT NULL,
    version     INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    id          TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES users(id),
    post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    content     TEXT NOT NULL,
    version     INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS users_role_idx       ON users(role);
CREATE INDEX IF NOT EXISTS posts_created_idx    ON posts(created_at);
CREATE INDEX IF NOT EXISTS comments_post_idx    ON comments(post_id);
CREATE INDEX IF NOT EXISTS comments_created_idx ON comments(created_at);

PRAGMA user_version = 1;
";
