//! Log decoding
//!
//! Maps raw EVM logs emitted by a gamble board contract to typed
//! [`GambleEvent`]s. The board emits its own lifecycle events plus the
//! standard arbitrable (ERC-792) and evidence (ERC-1497) events; topic0 selects
//! the event and the ABI body is decoded with `alloy-sol-types`.
//!
//! # Example
//!
//! ```no_run
//! use betboard::decoder::{LogDecoder, RawLog};
//!
//! # fn main() -> betboard::Result<()> {
//! let line = std::fs::read_to_string("log.json")?;
//! let raw: RawLog = serde_json::from_str(&line)?;
//! let decoded = LogDecoder::new().decode(&raw)?;
//! println!("{} at {}", decoded.event.name(), decoded.position());
//! # Ok(())
//! # }
//! ```

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolEvent;
use betboard_core::{
    BetState, BoardError, DecodedEvent, EventEnvelope, EventPosition, GambleEvent, Result,
};
use serde::{Deserialize, Serialize};

/// Solidity event declarations of the gamble board.
pub mod abi {
    use alloy_sol_types::sol;

    sol! {
        #[derive(Debug, PartialEq, Eq)]
        event BetCreated(uint256 indexed betID, string country, string league, string category);

        #[derive(Debug, PartialEq, Eq)]
        event BetPlaced(uint256 indexed betID, uint8 state, address backer);

        #[derive(Debug, PartialEq, Eq)]
        event BetStateChanged(uint256 indexed betID, uint8 state);

        #[derive(Debug, PartialEq, Eq)]
        event BetRefund(uint256 indexed betID, uint8 state, uint256 backerStake, uint256 creatorStake);

        #[derive(Debug, PartialEq, Eq)]
        event BetVotedOn(uint256 indexed betID, int8 outcome);

        #[derive(Debug, PartialEq, Eq)]
        event Dispute(address indexed _arbitrator, uint256 indexed _disputeID, uint256 _metaEvidenceID, uint256 _evidenceGroupID);

        #[derive(Debug, PartialEq, Eq)]
        event Evidence(address indexed _arbitrator, uint256 indexed _evidenceGroupID, address indexed _party, string _evidence);

        #[derive(Debug, PartialEq, Eq)]
        event Ruling(address indexed _arbitrator, uint256 indexed _disputeID, uint256 _ruling);

        #[derive(Debug, PartialEq, Eq)]
        event MetaEvidence(uint256 indexed _metaEvidenceID, string _evidence);
    }
}

/// A log as delivered by the ingestion pipeline, with its block and
/// transaction context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub block_timestamp: u64,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    pub transaction_index: u64,
    pub log_index: u64,
    /// Sender of the transaction that emitted the log.
    pub sender: Address,
}

impl RawLog {
    pub fn position(&self) -> EventPosition {
        EventPosition::new(self.block_number, self.transaction_index, self.log_index)
    }

    pub fn envelope(&self) -> EventEnvelope {
        EventEnvelope {
            contract: self.address,
            position: self.position(),
            block_timestamp: self.block_timestamp,
            transaction_hash: self.transaction_hash,
            sender: self.sender,
        }
    }
}

/// Build a [`RawLog`] for a board event, as the chain would emit it.
pub fn encode_log<E: SolEvent>(
    event: &E,
    address: Address,
    position: EventPosition,
    block_timestamp: u64,
    sender: Address,
) -> RawLog {
    let log_data = event.encode_log_data();
    RawLog {
        address,
        topics: log_data.topics().to_vec(),
        data: log_data.data,
        block_number: position.block_number,
        block_timestamp,
        transaction_hash: None,
        transaction_index: position.transaction_index,
        log_index: position.log_index,
        sender,
    }
}

/// Decoder for gamble board logs.
#[derive(Debug, Clone, Default)]
pub struct LogDecoder {
    contract: Option<Address>,
}

impl LogDecoder {
    /// Decoder accepting logs from any address.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that rejects logs not emitted by `contract`.
    pub fn for_contract(contract: Address) -> Self {
        Self {
            contract: Some(contract),
        }
    }

    pub fn contract(&self) -> Option<Address> {
        self.contract
    }

    /// Decode a raw log into a typed event.
    pub fn decode(&self, log: &RawLog) -> Result<DecodedEvent> {
        if let Some(expected) = self.contract {
            if log.address != expected {
                return Err(BoardError::Decode(format!(
                    "Log {} emitted by {} instead of board {}",
                    log.position(),
                    log.address,
                    expected
                )));
            }
        }

        let topic0 = *log.topics.first().ok_or_else(|| {
            BoardError::Decode(format!("Log {} has no topics", log.position()))
        })?;

        let event = if topic0 == abi::BetCreated::SIGNATURE_HASH {
            let e = decode_body::<abi::BetCreated>(log)?;
            GambleEvent::BetCreated {
                bet_id: e.betID,
                country: e.country,
                league: e.league,
                category: e.category,
            }
        } else if topic0 == abi::BetPlaced::SIGNATURE_HASH {
            let e = decode_body::<abi::BetPlaced>(log)?;
            GambleEvent::BetPlaced {
                bet_id: e.betID,
                state: BetState::try_from(e.state)?,
                backer: e.backer,
            }
        } else if topic0 == abi::BetStateChanged::SIGNATURE_HASH {
            let e = decode_body::<abi::BetStateChanged>(log)?;
            GambleEvent::BetStateChanged {
                bet_id: e.betID,
                state: BetState::try_from(e.state)?,
            }
        } else if topic0 == abi::BetRefund::SIGNATURE_HASH {
            let e = decode_body::<abi::BetRefund>(log)?;
            GambleEvent::BetRefund {
                bet_id: e.betID,
                state: BetState::try_from(e.state)?,
                backer_stake: e.backerStake,
                creator_stake: e.creatorStake,
            }
        } else if topic0 == abi::BetVotedOn::SIGNATURE_HASH {
            let e = decode_body::<abi::BetVotedOn>(log)?;
            GambleEvent::BetVotedOn {
                bet_id: e.betID,
                outcome: i32::from(e.outcome),
            }
        } else if topic0 == abi::Dispute::SIGNATURE_HASH {
            let e = decode_body::<abi::Dispute>(log)?;
            GambleEvent::Dispute {
                bet_id: e._evidenceGroupID,
                dispute_id: e._disputeID,
            }
        } else if topic0 == abi::Evidence::SIGNATURE_HASH {
            let e = decode_body::<abi::Evidence>(log)?;
            GambleEvent::Evidence {
                bet_id: e._evidenceGroupID,
                party: e._party,
                evidence: e._evidence,
            }
        } else if topic0 == abi::Ruling::SIGNATURE_HASH {
            let e = decode_body::<abi::Ruling>(log)?;
            GambleEvent::Ruling {
                dispute_id: e._disputeID,
                ruling: e._ruling,
            }
        } else if topic0 == abi::MetaEvidence::SIGNATURE_HASH {
            let e = decode_body::<abi::MetaEvidence>(log)?;
            GambleEvent::MetaEvidence {
                bet_id: e._metaEvidenceID,
                evidence: e._evidence,
            }
        } else {
            return Err(BoardError::Decode(format!(
                "Log {} has unknown event topic {}",
                log.position(),
                topic0
            )));
        };

        Ok(DecodedEvent::new(log.envelope(), event))
    }
}

fn decode_body<E: SolEvent>(log: &RawLog) -> Result<E> {
    E::decode_raw_log(log.topics.iter().copied(), &log.data, true).map_err(|e| {
        BoardError::Decode(format!(
            "Log {} is not a valid {}: {}",
            log.position(),
            E::SIGNATURE,
            e
        ))
    })
}
