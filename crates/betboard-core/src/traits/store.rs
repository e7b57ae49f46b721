use crate::error::Result;
use crate::types::{Bet, EventPosition, Fixture, League};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Writes produced by a single event.
///
/// A change set is committed as a unit together with the position of the
/// event that produced it; either every write lands or none does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub position: EventPosition,
    pub bets: Vec<Bet>,
    pub fixtures: Vec<Fixture>,
    pub leagues: Vec<League>,
}

impl ChangeSet {
    pub fn new(position: EventPosition) -> Self {
        Self {
            position,
            bets: Vec::new(),
            fixtures: Vec::new(),
            leagues: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty() && self.fixtures.is_empty() && self.leagues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bets.len() + self.fixtures.len() + self.leagues.len()
    }

    pub fn bet(&self, id: &str) -> Option<&Bet> {
        self.bets.iter().find(|b| b.id == id)
    }

    pub fn fixture(&self, id: &str) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.id == id)
    }

    pub fn league(&self, id: &str) -> Option<&League> {
        self.leagues.iter().find(|l| l.id == id)
    }

    /// Stage a bet, replacing an earlier staged copy.
    pub fn put_bet(&mut self, bet: Bet) {
        match self.bets.iter_mut().find(|b| b.id == bet.id) {
            Some(slot) => *slot = bet,
            None => self.bets.push(bet),
        }
    }

    pub fn put_fixture(&mut self, fixture: Fixture) {
        match self.fixtures.iter_mut().find(|f| f.id == fixture.id) {
            Some(slot) => *slot = fixture,
            None => self.fixtures.push(fixture),
        }
    }

    pub fn put_league(&mut self, league: League) {
        match self.leagues.iter_mut().find(|l| l.id == league.id) {
            Some(slot) => *slot = league,
            None => self.leagues.push(league),
        }
    }
}

/// Row counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub bets: usize,
    pub fixtures: usize,
    pub leagues: usize,
}

/// Entity store: load/save-by-id document store for the projection.
///
/// Entities are never deleted. `commit` must apply the whole change set and
/// advance the cursor atomically, and must refuse a change set whose position
/// is not after the current cursor.
pub trait EntityStore: Send + Sync {
    fn load_bet(&self, id: &str) -> Result<Option<Bet>>;

    fn load_fixture(&self, id: &str) -> Result<Option<Fixture>>;

    fn load_league(&self, id: &str) -> Result<Option<League>>;

    /// Position of the last applied event, `None` for an empty projection.
    fn cursor(&self) -> Result<Option<EventPosition>>;

    /// Apply all writes of one event and advance the cursor.
    fn commit(&self, changes: ChangeSet) -> Result<()>;

    /// Bets of a fixture, in fixture member order.
    fn bets_for_fixture(&self, fixture_id: &str) -> Result<Vec<Bet>>;

    fn fixtures_for_league(&self, league_id: &str) -> Result<Vec<Fixture>>;

    /// Bets where the account is creator or backer.
    fn bets_for_account(&self, account: Address) -> Result<Vec<Bet>>;

    fn counts(&self) -> Result<EntityCounts>;
}
