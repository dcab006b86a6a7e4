//! SQL schema for the incident registry SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE CHECK (username != ''),
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS persons (
    id                  TEXT PRIMARY KEY,
    registration_number TEXT NOT NULL UNIQUE,
    name                TEXT NOT NULL,
    address             TEXT NOT NULL,
    role                TEXT NOT NULL CHECK (role IN ('suspect', 'witness', 'victim')),
    phone               TEXT NOT NULL,
    email               TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS incidents (
    id                  TEXT PRIMARY KEY,
    registration_number TEXT NOT NULL UNIQUE,
    type                TEXT NOT NULL,
    description         TEXT NOT NULL,
    location            TEXT NOT NULL,
    date                TEXT NOT NULL,   -- fixed-width RFC 3339 UTC; server-assigned
    severity            TEXT NOT NULL CHECK (severity IN ('low', 'medium', 'high'))
);

-- Many-to-many join. The composite key forbids duplicate pairs; deleting
-- either side removes the pair.
CREATE TABLE IF NOT EXISTS incident_persons (
    incident_id TEXT NOT NULL REFERENCES incidents(id) ON DELETE CASCADE,
    person_id   TEXT NOT NULL REFERENCES persons(id)   ON DELETE CASCADE,
    PRIMARY KEY (incident_id, person_id)
);

CREATE INDEX IF NOT EXISTS incident_persons_person_idx ON incident_persons(person_id);
CREATE INDEX IF NOT EXISTS incidents_date_idx          ON incidents(date);

PRAGMA user_version = 1;
";
