//! Row <-> entity conversion.
//!
//! 256-bit amounts and ids are stored as decimal text, addresses as
//! lowercase hex.

use alloy_primitives::{Address, U256};
use betboard_core::{
    address_hex,
    error::{BoardError, Result},
    Bet, BetState, Fixture, League,
};
use rusqlite::Row;

pub(crate) const BET_COLUMNS: &str = "id, bet_id, staking_deadline, voting_deadline, \
    backer_stake, creator_stake, outcome, state, creator, backer, description, \
    creator_bet_description, country, league, category, dispute_id, creator_has_voted, \
    backer_has_voted, creator_provided_evidence, backer_provided_evidence, time_created, \
    time_updated, creator_backer, event, meta_evidence, evidence";

pub(crate) const FIXTURE_COLUMNS: &str =
    "id, description, start_time, country, league, category, day_bucket";

/// Raw bet row as read from SQLite, before parsing.
pub(crate) struct BetRow {
    id: String,
    bet_id: String,
    staking_deadline: i64,
    voting_deadline: i64,
    backer_stake: String,
    creator_stake: String,
    outcome: Option<i32>,
    state: u8,
    creator: String,
    backer: Option<String>,
    description: String,
    creator_bet_description: String,
    country: String,
    league: String,
    category: String,
    dispute_id: Option<String>,
    creator_has_voted: bool,
    backer_has_voted: bool,
    creator_provided_evidence: bool,
    backer_provided_evidence: bool,
    time_created: i64,
    time_updated: i64,
    creator_backer: String,
    event: String,
    meta_evidence: Option<String>,
    evidence: String,
}

impl BetRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            bet_id: row.get(1)?,
            staking_deadline: row.get(2)?,
            voting_deadline: row.get(3)?,
            backer_stake: row.get(4)?,
            creator_stake: row.get(5)?,
            outcome: row.get(6)?,
            state: row.get(7)?,
            creator: row.get(8)?,
            backer: row.get(9)?,
            description: row.get(10)?,
            creator_bet_description: row.get(11)?,
            country: row.get(12)?,
            league: row.get(13)?,
            category: row.get(14)?,
            dispute_id: row.get(15)?,
            creator_has_voted: row.get(16)?,
            backer_has_voted: row.get(17)?,
            creator_provided_evidence: row.get(18)?,
            backer_provided_evidence: row.get(19)?,
            time_created: row.get(20)?,
            time_updated: row.get(21)?,
            creator_backer: row.get(22)?,
            event: row.get(23)?,
            meta_evidence: row.get(24)?,
            evidence: row.get(25)?,
        })
    }

    pub(crate) fn into_bet(self) -> Result<Bet> {
        Ok(Bet {
            bet_id: parse_u256(&self.bet_id)?,
            staking_deadline: self.staking_deadline as u64,
            voting_deadline: self.voting_deadline as u64,
            backer_stake: parse_u256(&self.backer_stake)?,
            creator_stake: parse_u256(&self.creator_stake)?,
            outcome: self.outcome,
            state: BetState::try_from(self.state)
                .map_err(|e| BoardError::Store(format!("Bet {}: {}", self.id, e)))?,
            creator: parse_address(&self.creator)?,
            backer: self.backer.as_deref().map(parse_address).transpose()?,
            description: self.description,
            creator_bet_description: self.creator_bet_description,
            country: self.country,
            league: self.league,
            category: self.category,
            dispute_id: self.dispute_id.as_deref().map(parse_u256).transpose()?,
            creator_has_voted: self.creator_has_voted,
            backer_has_voted: self.backer_has_voted,
            creator_provided_evidence: self.creator_provided_evidence,
            backer_provided_evidence: self.backer_provided_evidence,
            time_created: self.time_created as u64,
            time_updated: self.time_updated as u64,
            creator_backer: self.creator_backer,
            event: self.event,
            meta_evidence: self.meta_evidence,
            evidence: serde_json::from_str(&self.evidence)?,
            id: self.id,
        })
    }
}

/// Bind parameters for an `INSERT ... (BET_COLUMNS)` statement.
pub(crate) struct BetParams {
    pub(crate) bet_id: String,
    pub(crate) backer_stake: String,
    pub(crate) creator_stake: String,
    pub(crate) creator: String,
    pub(crate) backer: Option<String>,
    pub(crate) dispute_id: Option<String>,
    pub(crate) evidence: String,
}

impl BetParams {
    pub(crate) fn new(bet: &Bet) -> Result<Self> {
        Ok(Self {
            bet_id: bet.bet_id.to_string(),
            backer_stake: bet.backer_stake.to_string(),
            creator_stake: bet.creator_stake.to_string(),
            creator: address_hex(bet.creator),
            backer: bet.backer.map(address_hex),
            dispute_id: bet.dispute_id.map(|d| d.to_string()),
            evidence: serde_json::to_string(&bet.evidence)?,
        })
    }
}

pub(crate) fn fixture_from_row(row: &Row<'_>) -> rusqlite::Result<Fixture> {
    Ok(Fixture {
        id: row.get(0)?,
        description: row.get(1)?,
        start_time: row.get::<_, i64>(2)? as u64,
        country: row.get(3)?,
        league: row.get(4)?,
        category: row.get(5)?,
        day_bucket: row.get::<_, i64>(6)? as u64,
        bet_ids: Vec::new(),
    })
}

pub(crate) fn league_from_row(row: &Row<'_>) -> rusqlite::Result<League> {
    Ok(League {
        id: row.get(0)?,
        country: row.get(1)?,
        category: row.get(2)?,
        league: row.get(3)?,
    })
}

pub(crate) fn parse_u256(text: &str) -> Result<U256> {
    text.parse::<U256>()
        .map_err(|e| BoardError::Store(format!("Invalid integer '{}': {}", text, e)))
}

pub(crate) fn parse_address(text: &str) -> Result<Address> {
    text.parse::<Address>()
        .map_err(|e| BoardError::Store(format!("Invalid address '{}': {}", text, e)))
}
