//! In-memory entity store
//!
//! Keeps the projection in `parking_lot::RwLock`-guarded maps. A commit
//! applies the whole change set under one write lock, so readers never see
//! part of an event.

use alloy_primitives::Address;
use betboard_core::{
    bet_key, Bet, BoardError, ChangeSet, EntityCounts, EntityStore, EventPosition, Fixture,
    League, Result,
};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Inner {
    bets: HashMap<String, Bet>,
    fixtures: HashMap<String, Fixture>,
    leagues: HashMap<String, League>,
    cursor: Option<EventPosition>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityStore for MemoryStore {
    fn load_bet(&self, id: &str) -> Result<Option<Bet>> {
        Ok(self.inner.read().bets.get(id).cloned())
    }

    fn load_fixture(&self, id: &str) -> Result<Option<Fixture>> {
        Ok(self.inner.read().fixtures.get(id).cloned())
    }

    fn load_league(&self, id: &str) -> Result<Option<League>> {
        Ok(self.inner.read().leagues.get(id).cloned())
    }

    fn cursor(&self) -> Result<Option<EventPosition>> {
        Ok(self.inner.read().cursor)
    }

    fn commit(&self, changes: ChangeSet) -> Result<()> {
        let mut inner = self.inner.write();
        if let Some(cursor) = inner.cursor {
            if changes.position <= cursor {
                return Err(BoardError::InvalidState(format!(
                    "Event {} is not after cursor {}",
                    changes.position, cursor
                )));
            }
        }

        for bet in changes.bets {
            inner.bets.insert(bet.id.clone(), bet);
        }
        for fixture in changes.fixtures {
            inner.fixtures.insert(fixture.id.clone(), fixture);
        }
        for league in changes.leagues {
            inner.leagues.insert(league.id.clone(), league);
        }
        inner.cursor = Some(changes.position);
        Ok(())
    }

    fn bets_for_fixture(&self, fixture_id: &str) -> Result<Vec<Bet>> {
        let inner = self.inner.read();
        let Some(fixture) = inner.fixtures.get(fixture_id) else {
            return Ok(Vec::new());
        };
        Ok(fixture
            .bet_ids
            .iter()
            .filter_map(|id| inner.bets.get(&bet_key(*id)).cloned())
            .collect())
    }

    fn fixtures_for_league(&self, league_id: &str) -> Result<Vec<Fixture>> {
        let inner = self.inner.read();
        let Some(league) = inner.leagues.get(league_id) else {
            return Ok(Vec::new());
        };
        let mut fixtures: Vec<Fixture> = inner
            .fixtures
            .values()
            .filter(|f| {
                f.country == league.country
                    && f.category == league.category
                    && f.league == league.league
            })
            .cloned()
            .collect();
        fixtures.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(fixtures)
    }

    fn bets_for_account(&self, account: Address) -> Result<Vec<Bet>> {
        let inner = self.inner.read();
        let mut bets: Vec<Bet> = inner
            .bets
            .values()
            .filter(|b| b.involves(account))
            .cloned()
            .collect();
        bets.sort_by(|a, b| {
            a.time_created
                .cmp(&b.time_created)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(bets)
    }

    fn counts(&self) -> Result<EntityCounts> {
        let inner = self.inner.read();
        Ok(EntityCounts {
            bets: inner.bets.len(),
            fixtures: inner.fixtures.len(),
            leagues: inner.leagues.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use betboard_core::{FixtureKey, LeagueKey};

    fn league() -> League {
        League::new(&LeagueKey::new("NL", "football", "Eredivisie"))
    }

    fn fixture(description: &str, start: u64) -> Fixture {
        let key = FixtureKey::new(description, "NL", "football", "Eredivisie", start);
        let mut fixture = Fixture::new(&key, start);
        fixture.merge_bet(U256::from(start), start);
        fixture
    }

    #[test]
    fn test_commit_is_gated_by_cursor() {
        let store = MemoryStore::new();
        let mut changes = ChangeSet::new(EventPosition::new(3, 0, 1));
        changes.put_league(league());
        store.commit(changes).unwrap();

        let mut stale = ChangeSet::new(EventPosition::new(3, 0, 1));
        stale.put_fixture(fixture("a", 10));
        assert!(matches!(store.commit(stale), Err(BoardError::InvalidState(_))));

        assert_eq!(store.cursor().unwrap(), Some(EventPosition::new(3, 0, 1)));
        assert_eq!(
            store.counts().unwrap(),
            EntityCounts {
                bets: 0,
                fixtures: 0,
                leagues: 1
            }
        );
    }

    #[test]
    fn test_fixtures_for_league_sorted_by_start() {
        let store = MemoryStore::new();
        let mut changes = ChangeSet::new(EventPosition::new(1, 0, 0));
        changes.put_league(league());
        changes.put_fixture(fixture("late", 200_000));
        changes.put_fixture(fixture("early", 100_000));
        store.commit(changes).unwrap();

        let fixtures = store.fixtures_for_league("NL|football|Eredivisie").unwrap();
        let names: Vec<&str> = fixtures.iter().map(|f| f.description.as_str()).collect();
        assert_eq!(names, vec!["early", "late"]);
        assert!(store.fixtures_for_league("XX|x|x").unwrap().is_empty());
    }
}
