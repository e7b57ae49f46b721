//! Simulated board chain: each call emits one log in a new block and records
//! the matching contract storage at that block.

#![allow(dead_code)]

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use betboard::decoder::{abi, encode_log};
use betboard::{BetRecord, BetState, EventPosition, MemoryContractState, RawLog};
use std::sync::Arc;

pub const GENESIS_TIME: u64 = 1_700_000_000;
pub const DAY: u64 = 86_400;

pub fn board() -> Address {
    Address::repeat_byte(0xB0)
}

pub fn creator() -> Address {
    Address::repeat_byte(0xC1)
}

pub fn backer() -> Address {
    Address::repeat_byte(0xB2)
}

pub fn stranger() -> Address {
    Address::repeat_byte(0x99)
}

pub fn arbitrator() -> Address {
    Address::repeat_byte(0xA1)
}

pub struct Chain {
    pub state: Arc<MemoryContractState>,
    pub logs: Vec<RawLog>,
    block: u64,
}

impl Chain {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MemoryContractState::new()),
            logs: Vec::new(),
            block: 1_000,
        }
    }

    pub fn block(&self) -> u64 {
        self.block
    }

    fn emit<E: SolEvent>(&mut self, event: E, sender: Address) -> RawLog {
        let log = encode_log(
            &event,
            board(),
            EventPosition::new(self.block, 0, 0),
            GENESIS_TIME + (self.block - 1_000) * 12,
            sender,
        );
        self.logs.push(log.clone());
        log
    }

    fn next_block(&mut self) -> u64 {
        self.block += 1;
        self.block
    }

    pub fn create(&mut self, id: u64, description: &str, staking_deadline: u64) -> RawLog {
        self.create_in(id, description, staking_deadline, "Eredivisie")
    }

    pub fn create_in(
        &mut self,
        id: u64,
        description: &str,
        staking_deadline: u64,
        league: &str,
    ) -> RawLog {
        let block = self.next_block();
        self.state.record_bet(
            block,
            U256::from(id),
            BetRecord {
                staking_deadline,
                voting_deadline: staking_deadline + DAY,
                backer_stake: U256::ZERO,
                creator_stake: U256::from(10u64).pow(U256::from(18)),
                outcome: None,
                state: BetState::Created,
                creator: creator(),
                backer: Address::ZERO,
                description: description.into(),
                creator_description: format!("{} (creator)", description),
            },
        );
        self.emit(
            abi::BetCreated {
                betID: U256::from(id),
                country: "NL".into(),
                league: league.into(),
                category: "football".into(),
            },
            creator(),
        )
    }

    pub fn place(&mut self, id: u64) -> RawLog {
        let block = self.next_block();
        self.state
            .update_bet(block, U256::from(id), |r| {
                r.state = BetState::Placed;
                r.backer = backer();
                r.backer_stake = r.creator_stake;
            })
            .unwrap();
        self.emit(
            abi::BetPlaced {
                betID: U256::from(id),
                state: BetState::Placed.code(),
                backer: backer(),
            },
            backer(),
        )
    }

    pub fn vote(&mut self, id: u64, sender: Address, outcome: i8) -> RawLog {
        let block = self.next_block();
        self.state
            .update_bet(block, U256::from(id), |r| r.state = BetState::Voting)
            .unwrap();
        self.emit(
            abi::BetVotedOn {
                betID: U256::from(id),
                outcome,
            },
            sender,
        )
    }

    pub fn dispute(&mut self, id: u64, dispute_id: u64) -> RawLog {
        let block = self.next_block();
        self.state
            .update_bet(block, U256::from(id), |r| r.state = BetState::Disputed)
            .unwrap();
        self.state
            .record_dispute(block, U256::from(dispute_id), U256::from(id));
        self.emit(
            abi::Dispute {
                _arbitrator: arbitrator(),
                _disputeID: U256::from(dispute_id),
                _metaEvidenceID: U256::from(id),
                _evidenceGroupID: U256::from(id),
            },
            backer(),
        )
    }

    pub fn evidence(&mut self, id: u64, sender: Address, uri: &str) -> RawLog {
        self.next_block();
        self.emit(
            abi::Evidence {
                _arbitrator: arbitrator(),
                _evidenceGroupID: U256::from(id),
                _party: sender,
                _evidence: uri.into(),
            },
            sender,
        )
    }

    pub fn rule(&mut self, dispute_id: u64, ruling: u64) -> RawLog {
        self.next_block();
        self.emit(
            abi::Ruling {
                _arbitrator: arbitrator(),
                _disputeID: U256::from(dispute_id),
                _ruling: U256::from(ruling),
            },
            arbitrator(),
        )
    }

    pub fn refund(&mut self, id: u64, creator_stake: u64) -> RawLog {
        let block = self.next_block();
        self.state
            .update_bet(block, U256::from(id), |r| {
                r.state = BetState::Refunded;
                r.backer_stake = U256::ZERO;
                r.creator_stake = U256::from(creator_stake);
            })
            .unwrap();
        self.emit(
            abi::BetRefund {
                betID: U256::from(id),
                state: BetState::Refunded.code(),
                backerStake: U256::ZERO,
                creatorStake: U256::from(creator_stake),
            },
            creator(),
        )
    }

    pub fn meta_evidence(&mut self, id: u64, uri: &str) -> RawLog {
        self.next_block();
        self.emit(
            abi::MetaEvidence {
                _metaEvidenceID: U256::from(id),
                _evidence: uri.into(),
            },
            creator(),
        )
    }

    /// A log that names a bet without the matching contract write.
    pub fn orphan_state_change(&mut self, id: u64, state: BetState) -> RawLog {
        self.next_block();
        self.emit(
            abi::BetStateChanged {
                betID: U256::from(id),
                state: state.code(),
            },
            creator(),
        )
    }
}
