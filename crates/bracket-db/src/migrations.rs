use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            joined_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS brackets (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            current_episode INTEGER NOT NULL DEFAULT 1 CHECK (current_episode BETWEEN 1 AND 4294967295),
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS couples (
            bracket_id  TEXT NOT NULL REFERENCES brackets(id),
            id          INTEGER NOT NULL,
            names       TEXT NOT NULL,
            position    INTEGER NOT NULL,
            PRIMARY KEY (bracket_id, id)
        );

        CREATE TABLE IF NOT EXISTS rankings (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id),
            bracket_id      TEXT NOT NULL REFERENCES brackets(id),
            episode_number  INTEGER NOT NULL CHECK (episode_number >= 1),
            submitted_at    TEXT NOT NULL
        );

        -- Upsert key: one ranking per user, bracket and episode
        CREATE UNIQUE INDEX IF NOT EXISTS idx_rankings_user_bracket_episode
            ON rankings(user_id, bracket_id, episode_number);

        CREATE INDEX IF NOT EXISTS idx_rankings_bracket_episode
            ON rankings(bracket_id, episode_number);

        CREATE TABLE IF NOT EXISTS ranking_entries (
            ranking_id  TEXT NOT NULL REFERENCES rankings(id) ON DELETE CASCADE,
            position    INTEGER NOT NULL,
            couple_id   INTEGER NOT NULL,
            rank_value  INTEGER NOT NULL,
            PRIMARY KEY (ranking_id, position)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
