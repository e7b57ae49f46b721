use crate::rows::{BetParams, BET_COLUMNS};
use betboard_core::{
    error::{BoardError, Result},
    Bet, EventPosition, Fixture, League,
};
use parking_lot::MutexGuard;
use rusqlite::{params, Connection, OptionalExtension};

/// Write transaction for one event's change set.
///
/// Holds the connection lock for its whole lifetime. Rolls back on drop
/// unless committed.
pub struct SqliteStoreTxn<'a> {
    conn: MutexGuard<'a, Connection>,
    in_txn: bool,
}

impl<'a> SqliteStoreTxn<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Result<Self> {
        conn.execute("BEGIN IMMEDIATE TRANSACTION", [])
            .map_err(|e| BoardError::Store(e.to_string()))?;

        Ok(Self { conn, in_txn: true })
    }

    /// Refuse positions at or before the stored cursor.
    pub fn check_position(&self, position: EventPosition) -> Result<()> {
        if let Some(cursor) = read_cursor(&self.conn)? {
            if position <= cursor {
                return Err(BoardError::InvalidState(format!(
                    "Event {} is not after cursor {}",
                    position, cursor
                )));
            }
        }
        Ok(())
    }

    pub fn upsert_bet(&self, bet: &Bet) -> Result<()> {
        let p = BetParams::new(bet)?;
        self.conn
            .execute(
                &format!(
                    "INSERT OR REPLACE INTO bets ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, \
                     ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, \
                     ?24, ?25, ?26)",
                    BET_COLUMNS
                ),
                params![
                    bet.id,
                    p.bet_id,
                    bet.staking_deadline as i64,
                    bet.voting_deadline as i64,
                    p.backer_stake,
                    p.creator_stake,
                    bet.outcome,
                    bet.state.code(),
                    p.creator,
                    p.backer,
                    bet.description,
                    bet.creator_bet_description,
                    bet.country,
                    bet.league,
                    bet.category,
                    p.dispute_id,
                    bet.creator_has_voted,
                    bet.backer_has_voted,
                    bet.creator_provided_evidence,
                    bet.backer_provided_evidence,
                    bet.time_created as i64,
                    bet.time_updated as i64,
                    bet.creator_backer,
                    bet.event,
                    bet.meta_evidence,
                    p.evidence,
                ],
            )
            .map_err(|e| BoardError::Store(e.to_string()))?;
        Ok(())
    }

    /// Upsert a fixture and rewrite its member list.
    pub fn upsert_fixture(&self, fixture: &Fixture) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO fixtures
                    (id, description, start_time, country, league, category, day_bucket)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    fixture.id,
                    fixture.description,
                    fixture.start_time as i64,
                    fixture.country,
                    fixture.league,
                    fixture.category,
                    fixture.day_bucket as i64,
                ],
            )
            .map_err(|e| BoardError::Store(e.to_string()))?;

        self.conn
            .execute(
                "DELETE FROM fixture_bets WHERE fixture_id = ?1",
                [&fixture.id],
            )
            .map_err(|e| BoardError::Store(e.to_string()))?;

        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO fixture_bets (fixture_id, position, bet_id) VALUES (?1, ?2, ?3)",
            )
            .map_err(|e| BoardError::Store(e.to_string()))?;
        for (position, bet_id) in fixture.bet_ids.iter().enumerate() {
            stmt.execute(params![fixture.id, position as i64, bet_id.to_string()])
                .map_err(|e| BoardError::Store(e.to_string()))?;
        }
        Ok(())
    }

    pub fn upsert_league(&self, league: &League) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO leagues (id, country, category, league)
                 VALUES (?1, ?2, ?3, ?4)",
                params![league.id, league.country, league.category, league.league],
            )
            .map_err(|e| BoardError::Store(e.to_string()))?;
        Ok(())
    }

    /// Advance the cursor and commit.
    pub fn commit(mut self, cursor: EventPosition) -> Result<()> {
        if self.in_txn {
            self.conn
                .execute(
                    "UPDATE projection_meta
                     SET cursor_block = ?1, cursor_tx = ?2, cursor_log = ?3,
                         updated_at = datetime('now')
                     WHERE id = 0",
                    params![
                        cursor.block_number as i64,
                        cursor.transaction_index as i64,
                        cursor.log_index as i64,
                    ],
                )
                .map_err(|e| BoardError::Store(e.to_string()))?;

            self.conn
                .execute("COMMIT", [])
                .map_err(|e| BoardError::Store(e.to_string()))?;

            self.in_txn = false;
        }
        Ok(())
    }

    pub fn rollback(mut self) {
        if self.in_txn {
            let _ = self.conn.execute("ROLLBACK", []);
            self.in_txn = false;
        }
    }
}

impl<'a> Drop for SqliteStoreTxn<'a> {
    fn drop(&mut self) {
        if self.in_txn {
            let _ = self.conn.execute("ROLLBACK", []);
        }
    }
}

pub(crate) fn read_cursor(conn: &Connection) -> Result<Option<EventPosition>> {
    let row: Option<(Option<i64>, Option<i64>, Option<i64>)> = conn
        .query_row(
            "SELECT cursor_block, cursor_tx, cursor_log FROM projection_meta WHERE id = 0",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .map_err(|e| BoardError::Store(e.to_string()))?;

    Ok(match row {
        Some((Some(block), Some(tx), Some(log))) => {
            Some(EventPosition::new(block as u64, tx as u64, log as u64))
        }
        _ => None,
    })
}
