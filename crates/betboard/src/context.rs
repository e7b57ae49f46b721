//! Per-event projection context
//!
//! A [`ProjectionContext`] is what a handler sees while it processes one
//! event: read-through access to the entity store, the contract frozen at the
//! event's block, the event envelope, and the change set being staged. Loads
//! see staged writes first, so a handler that touches the same bet twice sees
//! its own update. Nothing reaches the store until the dispatcher commits.

use alloy_primitives::Address;
use betboard_core::{
    bet_key, Bet, BetId, BoardError, ChangeSet, ContractSnapshot, EntityStore, EventEnvelope,
    Fixture, League, Result,
};

pub struct ProjectionContext<'a> {
    store: &'a dyn EntityStore,
    snapshot: ContractSnapshot<'a>,
    envelope: &'a EventEnvelope,
    changes: ChangeSet,
}

impl<'a> ProjectionContext<'a> {
    pub fn new(
        store: &'a dyn EntityStore,
        snapshot: ContractSnapshot<'a>,
        envelope: &'a EventEnvelope,
    ) -> Self {
        Self {
            store,
            snapshot,
            envelope,
            changes: ChangeSet::new(envelope.position),
        }
    }

    /// Load a bet that must exist.
    pub fn bet(&self, id: BetId) -> Result<Bet> {
        self.bet_opt(id)?
            .ok_or_else(|| BoardError::missing_bet(bet_key(id)))
    }

    pub fn bet_opt(&self, id: BetId) -> Result<Option<Bet>> {
        let key = bet_key(id);
        match self.changes.bet(&key) {
            Some(bet) => Ok(Some(bet.clone())),
            None => self.store.load_bet(&key),
        }
    }

    pub fn fixture_opt(&self, id: &str) -> Result<Option<Fixture>> {
        match self.changes.fixture(id) {
            Some(fixture) => Ok(Some(fixture.clone())),
            None => self.store.load_fixture(id),
        }
    }

    pub fn league_opt(&self, id: &str) -> Result<Option<League>> {
        match self.changes.league(id) {
            Some(league) => Ok(Some(league.clone())),
            None => self.store.load_league(id),
        }
    }

    pub fn put_bet(&mut self, bet: Bet) {
        self.changes.put_bet(bet);
    }

    pub fn put_fixture(&mut self, fixture: Fixture) {
        self.changes.put_fixture(fixture);
    }

    pub fn put_league(&mut self, league: League) {
        self.changes.put_league(league);
    }

    /// Contract state as of the event's block.
    pub fn snapshot(&self) -> ContractSnapshot<'a> {
        self.snapshot
    }

    pub fn block_time(&self) -> u64 {
        self.envelope.block_timestamp
    }

    /// Sender of the transaction that emitted the event.
    pub fn sender(&self) -> Address {
        self.envelope.sender
    }

    pub fn into_changes(self) -> ChangeSet {
        self.changes
    }
}
