//! Projected entities: bets, fixtures and leagues.
//!
//! Every entity is addressed by a string id. Bets use the canonical hex form
//! of the on-chain bet id, fixtures and leagues use composite keys built from
//! their descriptive fields.

use super::state::BetState;
use alloy_primitives::{hex, Address, U256};
use serde::{Deserialize, Serialize};

/// On-chain bet identifier.
pub type BetId = U256;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Separator between composite key parts.
const KEY_SEPARATOR: char = '|';
/// Prefix for a separator or escape character inside a key part.
const KEY_ESCAPE: char = '\\';

/// Canonical store key for a bet: lowercase `0x` hex without leading zeros.
pub fn bet_key(id: BetId) -> String {
    format!("0x{:x}", id)
}

/// Lowercase `0x`-prefixed hex form of an account.
pub fn address_hex(address: Address) -> String {
    hex::encode_prefixed(address.as_slice())
}

/// Calendar-day bucket of a unix timestamp.
pub fn day_bucket(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

/// Join free-text parts into one key. Separators and escapes inside a part
/// are escaped, so distinct part lists never share a key.
fn composite_key<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut key = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        for c in part.chars() {
            if c == KEY_SEPARATOR || c == KEY_ESCAPE {
                key.push(KEY_ESCAPE);
            }
            key.push(c);
        }
    }
    key
}

/// A wager between a creator and a backer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: String,
    pub bet_id: BetId,
    pub staking_deadline: u64,
    pub voting_deadline: u64,
    pub backer_stake: U256,
    pub creator_stake: U256,
    /// `None` until a vote or ruling decides the bet.
    pub outcome: Option<i32>,
    pub state: BetState,
    pub creator: Address,
    /// Unset until the bet is placed.
    pub backer: Option<Address>,
    pub description: String,
    pub creator_bet_description: String,
    pub country: String,
    pub league: String,
    pub category: String,
    #[serde(rename = "disputeID")]
    pub dispute_id: Option<U256>,
    pub creator_has_voted: bool,
    pub backer_has_voted: bool,
    pub creator_provided_evidence: bool,
    pub backer_provided_evidence: bool,
    pub time_created: u64,
    pub time_updated: u64,
    /// Creator hex followed by backer hex once the bet is placed.
    pub creator_backer: String,
    /// Id of the fixture this bet belongs to.
    pub event: String,
    #[serde(default)]
    pub meta_evidence: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl Bet {
    /// Move `time_updated` forward to `block_time`, never backwards.
    pub fn touch(&mut self, block_time: u64) {
        self.time_updated = self.time_updated.max(block_time);
    }

    pub fn is_creator(&self, account: Address) -> bool {
        self.creator == account
    }

    pub fn is_backer(&self, account: Address) -> bool {
        self.backer == Some(account)
    }

    /// Whether `account` is one of the two parties.
    pub fn involves(&self, account: Address) -> bool {
        self.is_creator(account) || self.is_backer(account)
    }
}

/// Composite key of a fixture: bets on the same proposition, same taxonomy
/// and same staking day aggregate into one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixtureKey {
    pub description: String,
    pub country: String,
    pub category: String,
    pub league: String,
    pub day_bucket: u64,
}

impl FixtureKey {
    pub fn new(
        description: impl Into<String>,
        country: impl Into<String>,
        category: impl Into<String>,
        league: impl Into<String>,
        staking_deadline: u64,
    ) -> Self {
        Self {
            description: description.into(),
            country: country.into(),
            category: category.into(),
            league: league.into(),
            day_bucket: day_bucket(staking_deadline),
        }
    }

    pub fn for_bet(bet: &Bet) -> Self {
        Self::new(
            bet.description.clone(),
            bet.country.clone(),
            bet.category.clone(),
            bet.league.clone(),
            bet.staking_deadline,
        )
    }

    pub fn id(&self) -> String {
        let day = self.day_bucket.to_string();
        composite_key([
            self.description.as_str(),
            self.country.as_str(),
            self.category.as_str(),
            self.league.as_str(),
            day.as_str(),
        ])
    }
}

/// Aggregation of bets sharing description, taxonomy and day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: String,
    pub description: String,
    /// Earliest staking deadline among member bets.
    pub start_time: u64,
    pub country: String,
    pub league: String,
    pub category: String,
    pub day_bucket: u64,
    /// Member bets in the order they were created.
    #[serde(rename = "betIDs")]
    pub bet_ids: Vec<BetId>,
}

impl Fixture {
    pub fn new(key: &FixtureKey, start_time: u64) -> Self {
        Self {
            id: key.id(),
            description: key.description.clone(),
            start_time,
            country: key.country.clone(),
            league: key.league.clone(),
            category: key.category.clone(),
            day_bucket: key.day_bucket,
            bet_ids: Vec::new(),
        }
    }

    /// Merge a member bet: lowers `start_time` to the earliest deadline and
    /// records the bet once.
    pub fn merge_bet(&mut self, bet_id: BetId, staking_deadline: u64) {
        self.start_time = self.start_time.min(staking_deadline);
        if !self.bet_ids.contains(&bet_id) {
            self.bet_ids.push(bet_id);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeagueKey {
    pub country: String,
    pub category: String,
    pub league: String,
}

impl LeagueKey {
    pub fn new(
        country: impl Into<String>,
        category: impl Into<String>,
        league: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into(),
            category: category.into(),
            league: league.into(),
        }
    }

    pub fn id(&self) -> String {
        composite_key([
            self.country.as_str(),
            self.category.as_str(),
            self.league.as_str(),
        ])
    }
}

/// Distinct (country, category, league) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: String,
    pub country: String,
    pub category: String,
    pub league: String,
}

impl League {
    pub fn new(key: &LeagueKey) -> Self {
        Self {
            id: key.id(),
            country: key.country.clone(),
            category: key.category.clone(),
            league: key.league.clone(),
        }
    }
}
