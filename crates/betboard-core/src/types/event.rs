use super::entity::BetId;
use super::state::BetState;
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a log in the chain. Events are applied in strictly
/// increasing position order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventPosition {
    pub block_number: u64,
    pub transaction_index: u64,
    pub log_index: u64,
}

impl EventPosition {
    pub fn new(block_number: u64, transaction_index: u64, log_index: u64) -> Self {
        Self {
            block_number,
            transaction_index,
            log_index,
        }
    }
}

impl fmt::Display for EventPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.block_number, self.transaction_index, self.log_index
        )
    }
}

/// Fields common to every log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Emitting contract.
    pub contract: Address,
    pub position: EventPosition,
    /// Block timestamp, seconds since epoch.
    pub block_timestamp: u64,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    /// Transaction sender.
    pub sender: Address,
}

impl EventEnvelope {
    pub fn block_number(&self) -> u64 {
        self.position.block_number
    }
}

/// Gamble board events, including the arbitrable (ERC-792) and evidence
/// (ERC-1497) events the board emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GambleEvent {
    BetCreated {
        bet_id: BetId,
        country: String,
        league: String,
        category: String,
    },
    BetPlaced {
        bet_id: BetId,
        state: BetState,
        backer: Address,
    },
    BetStateChanged {
        bet_id: BetId,
        state: BetState,
    },
    BetRefund {
        bet_id: BetId,
        state: BetState,
        backer_stake: U256,
        creator_stake: U256,
    },
    BetVotedOn {
        bet_id: BetId,
        outcome: i32,
    },
    /// `bet_id` is the evidence group id of the dispute.
    Dispute {
        bet_id: BetId,
        dispute_id: U256,
    },
    /// `bet_id` is the evidence group id.
    Evidence {
        bet_id: BetId,
        party: Address,
        evidence: String,
    },
    Ruling {
        dispute_id: U256,
        ruling: U256,
    },
    /// `bet_id` is the meta-evidence id, which aliases the bet id.
    MetaEvidence {
        bet_id: BetId,
        evidence: String,
    },
}

impl GambleEvent {
    /// Event name used for handler routing.
    pub fn name(&self) -> &'static str {
        match self {
            GambleEvent::BetCreated { .. } => "BetCreated",
            GambleEvent::BetPlaced { .. } => "BetPlaced",
            GambleEvent::BetStateChanged { .. } => "BetStateChanged",
            GambleEvent::BetRefund { .. } => "BetRefund",
            GambleEvent::BetVotedOn { .. } => "BetVotedOn",
            GambleEvent::Dispute { .. } => "Dispute",
            GambleEvent::Evidence { .. } => "Evidence",
            GambleEvent::Ruling { .. } => "Ruling",
            GambleEvent::MetaEvidence { .. } => "MetaEvidence",
        }
    }

    /// The bet the event names directly. Rulings only carry a dispute id.
    pub fn bet_id(&self) -> Option<BetId> {
        match self {
            GambleEvent::BetCreated { bet_id, .. }
            | GambleEvent::BetPlaced { bet_id, .. }
            | GambleEvent::BetStateChanged { bet_id, .. }
            | GambleEvent::BetRefund { bet_id, .. }
            | GambleEvent::BetVotedOn { bet_id, .. }
            | GambleEvent::Dispute { bet_id, .. }
            | GambleEvent::Evidence { bet_id, .. }
            | GambleEvent::MetaEvidence { bet_id, .. } => Some(*bet_id),
            GambleEvent::Ruling { .. } => None,
        }
    }
}

/// A decoded log: envelope plus typed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedEvent {
    pub envelope: EventEnvelope,
    pub event: GambleEvent,
}

impl DecodedEvent {
    pub fn new(envelope: EventEnvelope, event: GambleEvent) -> Self {
        Self { envelope, event }
    }

    pub fn position(&self) -> EventPosition {
        self.envelope.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_order_by_block_then_tx_then_log() {
        let a = EventPosition::new(10, 0, 5);
        let b = EventPosition::new(10, 1, 0);
        let c = EventPosition::new(11, 0, 0);
        assert!(a < b && b < c);
        assert_eq!(a.to_string(), "10:0:5");
    }

    #[test]
    fn test_ruling_has_no_direct_bet() {
        let ruling = GambleEvent::Ruling {
            dispute_id: U256::from(3),
            ruling: U256::from(1),
        };
        assert_eq!(ruling.name(), "Ruling");
        assert!(ruling.bet_id().is_none());
    }
}
