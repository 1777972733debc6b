//! SQL schema for the FER SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS candidates (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    slug        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    category    TEXT NOT NULL,   -- 'miss' | 'awards'
    age         INTEGER,
    origin      TEXT,
    domain      TEXT,
    bio         TEXT,
    photo       TEXT,
    votes       INTEGER NOT NULL DEFAULT 0 CHECK (votes >= 0),
    created_at  TEXT NOT NULL    -- RFC 3339 UTC
);

-- The vote ledger. Rows are never updated.
-- UNIQUE (voter_id, category) is the one-vote-per-category invariant.
CREATE TABLE IF NOT EXISTS votes (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    voter_id     TEXT NOT NULL,
    category     TEXT NOT NULL,
    candidate_id INTEGER NOT NULL REFERENCES candidates(id) ON DELETE CASCADE,
    recorded_at  TEXT NOT NULL,
    UNIQUE (voter_id, category)
);

CREATE TABLE IF NOT EXISTS participants (
    voter_id    TEXT NOT NULL,
    edition     TEXT NOT NULL,
    enrolled_at TEXT NOT NULL,
    PRIMARY KEY (voter_id, edition)
);

CREATE TABLE IF NOT EXISTS users (
    username      TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    role          TEXT NOT NULL,   -- 'admin' | 'member'
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS candidates_category_idx ON candidates(category);
CREATE INDEX IF NOT EXISTS votes_candidate_idx     ON votes(candidate_id);

PRAGMA user_version = 1;
";
