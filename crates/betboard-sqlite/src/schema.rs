use betboard_core::error::{BoardError, Result};
use rusqlite::Connection;

/// Current schema version of the projection tables.
pub const SCHEMA_VERSION: u32 = 1;

/// Create the projection tables if they do not exist yet.
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS projection_meta (
            id INTEGER PRIMARY KEY CHECK (id = 0),
            cursor_block INTEGER,
            cursor_tx INTEGER,
            cursor_log INTEGER,
            schema_version INTEGER NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS bets (
            id TEXT PRIMARY KEY,
            bet_id TEXT NOT NULL,
            staking_deadline INTEGER NOT NULL,
            voting_deadline INTEGER NOT NULL,
            backer_stake TEXT NOT NULL,
            creator_stake TEXT NOT NULL,
            outcome INTEGER,
            state INTEGER NOT NULL,
            creator TEXT NOT NULL,
            backer TEXT,
            description TEXT NOT NULL,
            creator_bet_description TEXT NOT NULL,
            country TEXT NOT NULL,
            league TEXT NOT NULL,
            category TEXT NOT NULL,
            dispute_id TEXT,
            creator_has_voted INTEGER NOT NULL,
            backer_has_voted INTEGER NOT NULL,
            creator_provided_evidence INTEGER NOT NULL,
            backer_provided_evidence INTEGER NOT NULL,
            time_created INTEGER NOT NULL,
            time_updated INTEGER NOT NULL,
            creator_backer TEXT NOT NULL,
            event TEXT NOT NULL,
            meta_evidence TEXT,
            evidence TEXT NOT NULL DEFAULT '[]'
        );

        CREATE INDEX IF NOT EXISTS idx_bets_event ON bets(event);
        CREATE INDEX IF NOT EXISTS idx_bets_dispute ON bets(dispute_id);

        CREATE TABLE IF NOT EXISTS fixtures (
            id TEXT PRIMARY KEY,
            description TEXT NOT NULL,
            start_time INTEGER NOT NULL,
            country TEXT NOT NULL,
            league TEXT NOT NULL,
            category TEXT NOT NULL,
            day_bucket INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_fixtures_league
            ON fixtures(country, category, league);

        CREATE TABLE IF NOT EXISTS fixture_bets (
            fixture_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            bet_id TEXT NOT NULL,
            PRIMARY KEY (fixture_id, position)
        );

        CREATE TABLE IF NOT EXISTS leagues (
            id TEXT PRIMARY KEY,
            country TEXT NOT NULL,
            category TEXT NOT NULL,
            league TEXT NOT NULL
        );",
    )
    .map_err(|e| BoardError::Store(e.to_string()))?;

    conn.execute(
        "INSERT OR IGNORE INTO projection_meta (id, schema_version) VALUES (0, ?1)",
        [SCHEMA_VERSION as i64],
    )
    .map_err(|e| BoardError::Store(e.to_string()))?;

    check_version(conn)
}

/// Read the stored schema version.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    conn.query_row(
        "SELECT schema_version FROM projection_meta WHERE id = 0",
        [],
        |row| {
            let v: i64 = row.get(0)?;
            Ok(v as u32)
        },
    )
    .map_err(|e| BoardError::Store(e.to_string()))
}

/// Refuse to open a database written by a newer schema.
fn check_version(conn: &Connection) -> Result<()> {
    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(BoardError::InvalidState(format!(
            "Database schema version {} is newer than supported version {}",
            current, SCHEMA_VERSION
        )));
    }
    Ok(())
}
