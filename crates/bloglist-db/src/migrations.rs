use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL UNIQUE,
            name            TEXT,
            password_hash   TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS blogs (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            author      TEXT NOT NULL,
            url         TEXT NOT NULL,
            likes       INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_blogs_user
            ON blogs(user_id);

        -- Ordered owner -> blog references
        CREATE TABLE IF NOT EXISTS user_blogs (
            position    INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL REFERENCES users(id),
            blog_id     TEXT NOT NULL UNIQUE REFERENCES blogs(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_user_blogs_user
            ON user_blogs(user_id, position);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
