use crate::rows::{
    fixture_from_row, league_from_row, parse_u256, BetRow, BET_COLUMNS, FIXTURE_COLUMNS,
};
use crate::schema;
use crate::txn::{read_cursor, SqliteStoreTxn};
use alloy_primitives::Address;
use betboard_core::{
    address_hex,
    error::{BoardError, Result},
    Bet, ChangeSet, EntityCounts, EntityStore, EventPosition, Fixture, League, StoreConfig,
};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

/// SQLite-backed entity store
pub struct SqliteEntityStore {
    conn: Arc<Mutex<Connection>>,
    config: StoreConfig,
}

impl SqliteEntityStore {
    /// Open (or create) the store described by `cfg`.
    pub fn open(cfg: StoreConfig) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = cfg.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            &cfg.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| BoardError::Store(e.to_string()))?;

        Self::configure_connection(&conn, &cfg)?;
        schema::init(&conn)?;

        tracing::debug!("Opened entity store at {}", cfg.path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config: cfg,
        })
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| BoardError::Store(e.to_string()))?;
        schema::init(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config: StoreConfig::new(":memory:".into()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the underlying connection (for custom queries)
    pub fn conn(&self) -> &Arc<Mutex<Connection>> {
        &self.conn
    }

    pub fn schema_version(&self) -> Result<u32> {
        schema::schema_version(&self.conn.lock())
    }

    /// Configure SQLite connection
    fn configure_connection(conn: &Connection, cfg: &StoreConfig) -> Result<()> {
        if cfg.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(|e| BoardError::Config(e.to_string()))?;
        }

        conn.pragma_update(None, "synchronous", cfg.synchronous.as_pragma())
            .map_err(|e| BoardError::Config(e.to_string()))?;

        conn.pragma_update(None, "cache_size", cfg.cache_size)
            .map_err(|e| BoardError::Config(e.to_string()))?;

        Ok(())
    }

    fn query_bets(conn: &Connection, sql: &str, arg: &str) -> Result<Vec<Bet>> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| BoardError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([arg], BetRow::from_row)
            .map_err(|e| BoardError::Store(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BoardError::Store(e.to_string()))?;

        rows.into_iter().map(BetRow::into_bet).collect()
    }

    fn load_fixture_members(conn: &Connection, fixture: &mut Fixture) -> Result<()> {
        let mut stmt = conn
            .prepare_cached(
                "SELECT bet_id FROM fixture_bets WHERE fixture_id = ?1 ORDER BY position",
            )
            .map_err(|e| BoardError::Store(e.to_string()))?;
        let ids = stmt
            .query_map([&fixture.id], |row| row.get::<_, String>(0))
            .map_err(|e| BoardError::Store(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BoardError::Store(e.to_string()))?;

        fixture.bet_ids = ids
            .iter()
            .map(|id| parse_u256(id))
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }
}

impl EntityStore for SqliteEntityStore {
    fn load_bet(&self, id: &str) -> Result<Option<Bet>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                &format!("SELECT {} FROM bets WHERE id = ?1", BET_COLUMNS),
                [id],
                BetRow::from_row,
            )
            .optional()
            .map_err(|e| BoardError::Store(e.to_string()))?;

        row.map(BetRow::into_bet).transpose()
    }

    fn load_fixture(&self, id: &str) -> Result<Option<Fixture>> {
        let conn = self.conn.lock();
        let fixture = conn
            .query_row(
                &format!("SELECT {} FROM fixtures WHERE id = ?1", FIXTURE_COLUMNS),
                [id],
                fixture_from_row,
            )
            .optional()
            .map_err(|e| BoardError::Store(e.to_string()))?;

        match fixture {
            Some(mut fixture) => {
                Self::load_fixture_members(&conn, &mut fixture)?;
                Ok(Some(fixture))
            }
            None => Ok(None),
        }
    }

    fn load_league(&self, id: &str) -> Result<Option<League>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, country, category, league FROM leagues WHERE id = ?1",
            [id],
            league_from_row,
        )
        .optional()
        .map_err(|e| BoardError::Store(e.to_string()))
    }

    fn cursor(&self) -> Result<Option<EventPosition>> {
        read_cursor(&self.conn.lock())
    }

    fn commit(&self, changes: ChangeSet) -> Result<()> {
        let txn = SqliteStoreTxn::new(self.conn.lock())?;
        txn.check_position(changes.position)?;

        for bet in &changes.bets {
            txn.upsert_bet(bet)?;
        }
        for fixture in &changes.fixtures {
            txn.upsert_fixture(fixture)?;
        }
        for league in &changes.leagues {
            txn.upsert_league(league)?;
        }

        txn.commit(changes.position)?;

        tracing::trace!(
            "Committed {} writes at {}",
            changes.len(),
            changes.position
        );
        Ok(())
    }

    fn bets_for_fixture(&self, fixture_id: &str) -> Result<Vec<Bet>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM bets b
             JOIN fixture_bets fb ON fb.fixture_id = b.event AND fb.bet_id = b.bet_id
             WHERE b.event = ?1
             ORDER BY fb.position",
            BET_COLUMNS
                .split(", ")
                .map(|c| format!("b.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self::query_bets(&conn, &sql, fixture_id)
    }

    fn fixtures_for_league(&self, league_id: &str) -> Result<Vec<Fixture>> {
        let Some(league) = self.load_league(league_id)? else {
            return Ok(Vec::new());
        };

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM fixtures
                 WHERE country = ?1 AND category = ?2 AND league = ?3
                 ORDER BY start_time, id",
                FIXTURE_COLUMNS
            ))
            .map_err(|e| BoardError::Store(e.to_string()))?;
        let mut fixtures = stmt
            .query_map(
                [&league.country, &league.category, &league.league],
                fixture_from_row,
            )
            .map_err(|e| BoardError::Store(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BoardError::Store(e.to_string()))?;

        for fixture in &mut fixtures {
            Self::load_fixture_members(&conn, fixture)?;
        }
        Ok(fixtures)
    }

    fn bets_for_account(&self, account: Address) -> Result<Vec<Bet>> {
        let conn = self.conn.lock();
        Self::query_bets(
            &conn,
            &format!(
                "SELECT {} FROM bets WHERE instr(creator_backer, ?1) > 0 ORDER BY time_created, id",
                BET_COLUMNS
            ),
            &address_hex(account),
        )
    }

    fn counts(&self) -> Result<EntityCounts> {
        let conn = self.conn.lock();
        let count = |table: &str| -> Result<usize> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .map_err(|e| BoardError::Store(e.to_string()))
        };

        Ok(EntityCounts {
            bets: count("bets")?,
            fixtures: count("fixtures")?,
            leagues: count("leagues")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use betboard_core::{bet_key, BetState, FixtureKey, LeagueKey};
    use tempfile::TempDir;

    fn sample_bet(id: u64, creator: Address) -> Bet {
        let bet_id = U256::from(id);
        let key = FixtureKey::new("Ajax v PSV", "NL", "football", "Eredivisie", 172_800);
        Bet {
            id: bet_key(bet_id),
            bet_id,
            staking_deadline: 172_800,
            voting_deadline: 259_200,
            backer_stake: U256::from(10u64).pow(U256::from(20)),
            creator_stake: U256::from(5),
            outcome: None,
            state: BetState::Created,
            creator,
            backer: None,
            description: "Ajax v PSV".into(),
            creator_bet_description: "Ajax wins".into(),
            country: "NL".into(),
            league: "Eredivisie".into(),
            category: "football".into(),
            dispute_id: None,
            creator_has_voted: false,
            backer_has_voted: false,
            creator_provided_evidence: false,
            backer_provided_evidence: false,
            time_created: 100,
            time_updated: 100,
            creator_backer: address_hex(creator),
            event: key.id(),
            meta_evidence: None,
            evidence: vec!["ipfs://a".into()],
        }
    }

    fn open_temp() -> (SqliteEntityStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteEntityStore::open(StoreConfig::new(dir.path().join("board.db"))).unwrap();
        (store, dir)
    }

    #[test]
    fn test_bet_roundtrip_preserves_wide_amounts() {
        let (store, _dir) = open_temp();
        let creator = Address::repeat_byte(0x11);
        let mut bet = sample_bet(42, creator);
        bet.backer = Some(Address::repeat_byte(0x22));
        bet.dispute_id = Some(U256::MAX);
        bet.outcome = Some(-1);

        let mut changes = ChangeSet::new(EventPosition::new(1, 0, 0));
        changes.put_bet(bet.clone());
        store.commit(changes).unwrap();

        let loaded = store.load_bet(&bet.id).unwrap().unwrap();
        assert_eq!(loaded, bet);
        assert_eq!(store.cursor().unwrap(), Some(EventPosition::new(1, 0, 0)));
    }

    #[test]
    fn test_fixture_members_keep_order() {
        let (store, _dir) = open_temp();
        let creator = Address::repeat_byte(0x11);
        let key = FixtureKey::new("Ajax v PSV", "NL", "football", "Eredivisie", 172_800);
        let mut fixture = Fixture::new(&key, 172_800);
        for id in [7u64, 3, 9] {
            fixture.merge_bet(U256::from(id), 172_800);
        }

        let mut changes = ChangeSet::new(EventPosition::new(1, 0, 0));
        for id in [7u64, 3, 9] {
            changes.put_bet(sample_bet(id, creator));
        }
        changes.put_fixture(fixture.clone());
        changes.put_league(League::new(&LeagueKey::new("NL", "football", "Eredivisie")));
        store.commit(changes).unwrap();

        assert_eq!(store.load_fixture(&fixture.id).unwrap().unwrap(), fixture);

        let members: Vec<U256> = store
            .bets_for_fixture(&fixture.id)
            .unwrap()
            .into_iter()
            .map(|b| b.bet_id)
            .collect();
        assert_eq!(members, vec![U256::from(7), U256::from(3), U256::from(9)]);

        let league_fixtures = store.fixtures_for_league("NL|football|Eredivisie").unwrap();
        assert_eq!(league_fixtures.len(), 1);
        assert_eq!(
            store.counts().unwrap(),
            EntityCounts {
                bets: 3,
                fixtures: 1,
                leagues: 1
            }
        );
    }

    #[test]
    fn test_commit_rejects_stale_position() {
        let (store, _dir) = open_temp();
        let creator = Address::repeat_byte(0x11);

        let mut first = ChangeSet::new(EventPosition::new(5, 1, 0));
        first.put_bet(sample_bet(1, creator));
        store.commit(first).unwrap();

        let mut stale = ChangeSet::new(EventPosition::new(5, 0, 3));
        stale.put_bet(sample_bet(2, creator));
        assert!(store.commit(stale).is_err());

        // The rejected change set left nothing behind
        assert!(store.load_bet(&bet_key(U256::from(2))).unwrap().is_none());
        assert_eq!(store.cursor().unwrap(), Some(EventPosition::new(5, 1, 0)));
    }

    #[test]
    fn test_bets_for_account_matches_either_party() {
        let store = SqliteEntityStore::open_in_memory().unwrap();
        let creator = Address::repeat_byte(0x11);
        let backer = Address::repeat_byte(0x22);

        let mut placed = sample_bet(1, creator);
        placed.backer = Some(backer);
        placed.creator_backer = format!("{}{}", address_hex(creator), address_hex(backer));

        let mut changes = ChangeSet::new(EventPosition::new(1, 0, 0));
        changes.put_bet(placed);
        changes.put_bet(sample_bet(2, Address::repeat_byte(0x33)));
        store.commit(changes).unwrap();

        assert_eq!(store.bets_for_account(backer).unwrap().len(), 1);
        assert_eq!(store.bets_for_account(creator).unwrap().len(), 1);
        assert!(store
            .bets_for_account(Address::repeat_byte(0x44))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_reopen_keeps_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.db");
        {
            let store = SqliteEntityStore::open(StoreConfig::new(path.clone())).unwrap();
            assert_eq!(store.cursor().unwrap(), None);
            store.commit(ChangeSet::new(EventPosition::new(9, 2, 1))).unwrap();
        }
        let store = SqliteEntityStore::open(StoreConfig::new(path)).unwrap();
        assert_eq!(store.cursor().unwrap(), Some(EventPosition::new(9, 2, 1)));
        assert_eq!(store.schema_version().unwrap(), schema::SCHEMA_VERSION);
    }
}
