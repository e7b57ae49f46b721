use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a bet as stored by the gamble board contract.
///
/// The discriminants are the contract's own state codes. `Agreement = 2` and
/// `Disputed = 4` are relied upon by the arbitration flow and must not move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum BetState {
    Created = 0,
    Placed = 1,
    Agreement = 2,
    Voting = 3,
    Disputed = 4,
    Refunded = 5,
}

impl BetState {
    pub const ALL: [BetState; 6] = [
        BetState::Created,
        BetState::Placed,
        BetState::Agreement,
        BetState::Voting,
        BetState::Disputed,
        BetState::Refunded,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            BetState::Created => "CREATED",
            BetState::Placed => "PLACED",
            BetState::Agreement => "AGREEMENT",
            BetState::Voting => "VOTING",
            BetState::Disputed => "DISPUTED",
            BetState::Refunded => "REFUNDED",
        }
    }

    /// Whether the lifecycle expects `self -> next`.
    ///
    /// Agreement and Refunded are terminal. Staying in the same state is
    /// always fine (stake refreshes, votes, evidence).
    pub fn can_transition_to(self, next: BetState) -> bool {
        use BetState::*;

        if self == next {
            return true;
        }
        match self {
            Created => matches!(next, Placed | Refunded),
            Placed => matches!(next, Voting | Agreement | Disputed | Refunded),
            Voting => matches!(next, Agreement | Disputed | Refunded),
            Disputed => matches!(next, Agreement | Refunded),
            Agreement | Refunded => false,
        }
    }
}

impl TryFrom<u8> for BetState {
    type Error = BoardError;

    fn try_from(code: u8) -> Result<Self> {
        BetState::ALL
            .into_iter()
            .find(|state| state.code() == code)
            .ok_or_else(|| BoardError::Decode(format!("Unknown bet state code {}", code)))
    }
}

impl From<BetState> for u8 {
    fn from(state: BetState) -> u8 {
        state.code()
    }
}

impl fmt::Display for BetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
