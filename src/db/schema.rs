//! Database schema and migrations for newsdesk.
//!
//! Migrations are applied in order when the database is opened; the
//! schema_version table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Articles table
    r#"
CREATE TABLE articles (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    title         TEXT NOT NULL,            -- at most 500 chars
    summary       TEXT NOT NULL DEFAULT '',
    source        TEXT NOT NULL,            -- at most 255 chars
    url           TEXT NOT NULL UNIQUE,     -- primary dedupe key
    published_at  TEXT NOT NULL,            -- 'YYYY-MM-DD HH:MM:SS.ffffff' UTC
    created_at    TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (title, source)                  -- secondary dedupe key
);

CREATE INDEX idx_articles_published_at ON articles(published_at);
CREATE INDEX idx_articles_source ON articles(source);
"#,
];
