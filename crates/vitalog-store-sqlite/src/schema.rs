//! SQL schema for the vitalog SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Raw individual readings. Append-only; the UNIQUE dedup_key makes
-- re-ingestion of the same export a no-op.
CREATE TABLE IF NOT EXISTS readings (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id     TEXT NOT NULL,
    source_kind   TEXT NOT NULL,
    record_type   TEXT NOT NULL,
    short_name    TEXT NOT NULL,
    category      TEXT NOT NULL,
    value         REAL,
    unit          TEXT NOT NULL DEFAULT '',
    timestamp     TEXT NOT NULL,   -- ISO 8601 with UTC offset
    end_timestamp TEXT,
    metadata      TEXT NOT NULL DEFAULT '{}',
    dedup_key     TEXT NOT NULL UNIQUE
);

CREATE INDEX IF NOT EXISTS readings_entity_type_ts_idx
    ON readings(entity_id, record_type, timestamp);
CREATE INDEX IF NOT EXISTS readings_category_idx   ON readings(category);
CREATE INDEX IF NOT EXISTS readings_ts_idx         ON readings(timestamp);
CREATE INDEX IF NOT EXISTS readings_short_name_idx ON readings(short_name);

-- Derived daily narratives; at most one row per (entity, day, category).
CREATE TABLE IF NOT EXISTS summaries (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id       TEXT NOT NULL,
    date            TEXT NOT NULL,   -- YYYY-MM-DD
    category        TEXT NOT NULL,
    narrative       TEXT NOT NULL,
    structured_data TEXT NOT NULL DEFAULT '{}',
    UNIQUE (entity_id, date, category)
);

CREATE INDEX IF NOT EXISTS summaries_date_idx ON summaries(date);

-- Full-text index over narratives, kept in sync by triggers.
CREATE VIRTUAL TABLE IF NOT EXISTS summaries_fts USING fts5(
    narrative,
    content='summaries',
    content_rowid='id',
    tokenize='porter unicode61'
);

CREATE TRIGGER IF NOT EXISTS summaries_ai AFTER INSERT ON summaries BEGIN
    INSERT INTO summaries_fts(rowid, narrative) VALUES (new.id, new.narrative);
END;
CREATE TRIGGER IF NOT EXISTS summaries_ad AFTER DELETE ON summaries BEGIN
    INSERT INTO summaries_fts(summaries_fts, rowid, narrative)
    VALUES ('delete', old.id, old.narrative);
END;
CREATE TRIGGER IF NOT EXISTS summaries_au AFTER UPDATE ON summaries BEGIN
    INSERT INTO summaries_fts(summaries_fts, rowid, narrative)
    VALUES ('delete', old.id, old.narrative);
    INSERT INTO summaries_fts(rowid, narrative) VALUES (new.id, new.narrative);
END;

PRAGMA user_version = 1;
";
