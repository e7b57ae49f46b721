use crate::error::Result;
use crate::types::{BetId, BetRecord, BetState, VoteEvidenceFlags};
use alloy_primitives::U256;

/// Read-only access to gamble board storage at a given block height.
///
/// Implementations answer every read as of the end of block `at`; they must
/// never reflect later blocks. A failed read is a `ContractRead` error.
pub trait ContractReader: Send + Sync {
    /// `getBet`
    fn bet(&self, at: u64, bet_id: BetId) -> Result<BetRecord>;

    /// `getOutcome`
    fn outcome(&self, at: u64, bet_id: BetId) -> Result<Option<i32>> {
        Ok(self.bet(at, bet_id)?.outcome)
    }

    /// `getState`
    fn state(&self, at: u64, bet_id: BetId) -> Result<BetState> {
        Ok(self.bet(at, bet_id)?.state)
    }

    /// `getVoteEvidenceFlags`, only exposed by the earlier board schema.
    fn vote_evidence_flags(&self, _at: u64, _bet_id: BetId) -> Result<Option<VoteEvidenceFlags>> {
        Ok(None)
    }

    /// `disputeIdToBetId`
    fn dispute_bet_id(&self, at: u64, dispute_id: U256) -> Result<BetId>;
}

/// A contract reader frozen at one block height.
///
/// Handlers only ever see a snapshot, so every read they make is answered at
/// the height of the event being processed.
#[derive(Clone, Copy)]
pub struct ContractSnapshot<'a> {
    reader: &'a dyn ContractReader,
    block: u64,
}

impl<'a> ContractSnapshot<'a> {
    pub fn new(reader: &'a dyn ContractReader, block: u64) -> Self {
        Self { reader, block }
    }

    pub fn block(&self) -> u64 {
        self.block
    }

    pub fn bet(&self, bet_id: BetId) -> Result<BetRecord> {
        self.reader.bet(self.block, bet_id)
    }

    pub fn outcome(&self, bet_id: BetId) -> Result<Option<i32>> {
        self.reader.outcome(self.block, bet_id)
    }

    pub fn state(&self, bet_id: BetId) -> Result<BetState> {
        self.reader.state(self.block, bet_id)
    }

    pub fn vote_evidence_flags(&self, bet_id: BetId) -> Result<Option<VoteEvidenceFlags>> {
        self.reader.vote_evidence_flags(self.block, bet_id)
    }

    pub fn dispute_bet_id(&self, dispute_id: U256) -> Result<BetId> {
        self.reader.dispute_bet_id(self.block, dispute_id)
    }
}
