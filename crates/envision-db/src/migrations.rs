use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            first_name  TEXT NOT NULL,
            last_name   TEXT NOT NULL,
            grade       INTEGER NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        -- parent_id NULL marks a top-level comment; replies point at one.
        CREATE TABLE IF NOT EXISTS comments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_id   INTEGER REFERENCES comments(id),
            text        TEXT NOT NULL CHECK (length(text) < 200),
            post_date   TEXT NOT NULL,
            user_id     INTEGER NOT NULL REFERENCES users(id)
        );

        CREATE INDEX IF NOT EXISTS idx_comments_parent
            ON comments(parent_id, post_date);

        CREATE TABLE IF NOT EXISTS likes (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            comment_id  INTEGER NOT NULL REFERENCES comments(id),
            user_id     INTEGER NOT NULL REFERENCES users(id),
            UNIQUE(user_id, comment_id)
        );

        CREATE INDEX IF NOT EXISTS idx_likes_comment
            ON likes(comment_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
