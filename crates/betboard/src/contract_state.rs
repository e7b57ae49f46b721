//! Versioned in-memory contract state
//!
//! [`MemoryContractState`] keeps every stored value with the block height it
//! was written at and answers reads "as of" a block, which is what a
//! projection needs for deterministic replay. A read with nothing recorded at
//! or before the requested block fails like an unavailable node would, with a
//! `ContractRead` error.
//!
//! State can be loaded from a JSON [`ContractStateFile`]:
//!
//! ```json
//! {
//!   "bets": [
//!     { "block": 100, "bet_id": "0x1", "record": { "state": 0, "...": "..." } }
//!   ],
//!   "disputes": [{ "block": 140, "dispute_id": "0x7", "bet_id": "0x1" }],
//!   "vote_evidence_flags": []
//! }
//! ```

use alloy_primitives::U256;
use betboard_core::{
    bet_key, BetId, BetRecord, BoardError, ContractReader, Result, VoteEvidenceFlags,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// A value and the block it was written at.
type History<T> = BTreeMap<u64, T>;

fn as_of<T: Clone>(history: Option<&History<T>>, at: u64) -> Option<T> {
    history
        .and_then(|h| h.range(..=at).next_back())
        .map(|(_, value)| value.clone())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetEntry {
    pub block: u64,
    pub bet_id: BetId,
    pub record: BetRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeEntry {
    pub block: u64,
    pub dispute_id: U256,
    pub bet_id: BetId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagsEntry {
    pub block: u64,
    pub bet_id: BetId,
    pub flags: VoteEvidenceFlags,
}

/// Serialized contract state history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStateFile {
    #[serde(default)]
    pub bets: Vec<BetEntry>,
    #[serde(default)]
    pub disputes: Vec<DisputeEntry>,
    #[serde(default)]
    pub vote_evidence_flags: Vec<FlagsEntry>,
}

impl ContractStateFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Default)]
struct StateInner {
    bets: HashMap<BetId, History<BetRecord>>,
    disputes: HashMap<U256, History<BetId>>,
    flags: HashMap<BetId, History<VoteEvidenceFlags>>,
}

#[derive(Default)]
pub struct MemoryContractState {
    inner: RwLock<StateInner>,
}

impl MemoryContractState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = Self::from(ContractStateFile::load(path)?);
        tracing::debug!("Loaded contract state from {}", path.display());
        Ok(state)
    }

    /// Record the stored bet as of `block`.
    pub fn record_bet(&self, block: u64, bet_id: BetId, record: BetRecord) {
        self.inner
            .write()
            .bets
            .entry(bet_id)
            .or_default()
            .insert(block, record);
    }

    /// Derive the bet at `block` from its latest earlier version.
    pub fn update_bet<F>(&self, block: u64, bet_id: BetId, update: F) -> Result<()>
    where
        F: FnOnce(&mut BetRecord),
    {
        let mut inner = self.inner.write();
        let Some(mut record) = as_of(inner.bets.get(&bet_id), block) else {
            return Err(BoardError::InvalidState(format!(
                "No stored bet {} to update at block {}",
                bet_key(bet_id),
                block
            )));
        };
        update(&mut record);
        inner.bets.entry(bet_id).or_default().insert(block, record);
        Ok(())
    }

    pub fn record_dispute(&self, block: u64, dispute_id: U256, bet_id: BetId) {
        self.inner
            .write()
            .disputes
            .entry(dispute_id)
            .or_default()
            .insert(block, bet_id);
    }

    pub fn record_vote_evidence_flags(&self, block: u64, bet_id: BetId, flags: VoteEvidenceFlags) {
        self.inner
            .write()
            .flags
            .entry(bet_id)
            .or_default()
            .insert(block, flags);
    }
}

impl From<ContractStateFile> for MemoryContractState {
    fn from(file: ContractStateFile) -> Self {
        let state = Self::new();
        for entry in file.bets {
            state.record_bet(entry.block, entry.bet_id, entry.record);
        }
        for entry in file.disputes {
            state.record_dispute(entry.block, entry.dispute_id, entry.bet_id);
        }
        for entry in file.vote_evidence_flags {
            state.record_vote_evidence_flags(entry.block, entry.bet_id, entry.flags);
        }
        state
    }
}

impl ContractReader for MemoryContractState {
    fn bet(&self, at: u64, bet_id: BetId) -> Result<BetRecord> {
        as_of(self.inner.read().bets.get(&bet_id), at).ok_or_else(|| {
            BoardError::contract_read(at, format!("getBet({}) has no value", bet_key(bet_id)))
        })
    }

    fn vote_evidence_flags(&self, at: u64, bet_id: BetId) -> Result<Option<VoteEvidenceFlags>> {
        Ok(as_of(self.inner.read().flags.get(&bet_id), at))
    }

    fn dispute_bet_id(&self, at: u64, dispute_id: U256) -> Result<BetId> {
        as_of(self.inner.read().disputes.get(&dispute_id), at).ok_or_else(|| {
            BoardError::contract_read(
                at,
                format!("disputeIdToBetId({}) has no value", dispute_id),
            )
        })
    }
}
