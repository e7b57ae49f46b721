use super::state::BetState;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// A bet as held in contract storage (`getBet`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetRecord {
    pub staking_deadline: u64,
    pub voting_deadline: u64,
    pub backer_stake: U256,
    pub creator_stake: U256,
    /// The reader maps the contract's "undecided" sentinel to `None`.
    pub outcome: Option<i32>,
    pub state: BetState,
    pub creator: Address,
    /// Zero address until a backer stakes.
    pub backer: Address,
    pub description: String,
    pub creator_description: String,
}

/// Vote and evidence bookkeeping exposed by the earlier board schema
/// (`getVoteEvidenceFlags`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEvidenceFlags {
    pub creator_has_voted: bool,
    pub backer_has_voted: bool,
    pub creator_provided_evidence: bool,
    pub backer_provided_evidence: bool,
}
