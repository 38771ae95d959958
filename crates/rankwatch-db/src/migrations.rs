use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    // created_at columns hold RFC 3339 UTC strings written by the
    // application with fixed-width fractional seconds, so lexicographic
    // order on the TEXT column matches chronological order.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            first_name  TEXT NOT NULL,
            last_name   TEXT NOT NULL,
            company     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tracked_urls (
            id            TEXT PRIMARY KEY,
            search_phrase TEXT NOT NULL,
            location      TEXT NOT NULL,
            url           TEXT NOT NULL,
            user_id       TEXT NOT NULL REFERENCES users(id),
            created_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tracked_urls_owner
            ON tracked_urls(user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
