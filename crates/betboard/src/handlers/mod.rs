//! Gamble board projection handlers, one per event.
//!
//! Handlers load the entities an event touches, patch only the fields the
//! event owns, and take authoritative values (state, outcome, stakes) from
//! the contract snapshot at the event's block. A bet that must exist and
//! does not is a `MissingEntity` error, never a fresh record.

mod arbitration;
mod bet;
mod voting;

pub use arbitration::{DisputeHandler, EvidenceHandler, MetaEvidenceHandler, RulingHandler};
pub use bet::{BetCreatedHandler, BetPlacedHandler, BetRefundHandler, BetStateChangedHandler};
pub use voting::BetVotedOnHandler;

use alloy_primitives::Address;
use betboard_core::{Bet, BetState, BoardError, GambleEvent, VoteEvidenceFlags};

/// Which side of a bet an account is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Party {
    Creator,
    Backer,
}

impl Party {
    /// The side `account` is on. The creator wins if the same account holds
    /// both sides, so one event never flips both flags.
    pub(crate) fn of(bet: &Bet, account: Address) -> Option<Self> {
        if bet.is_creator(account) {
            Some(Party::Creator)
        } else if bet.is_backer(account) {
            Some(Party::Backer)
        } else {
            None
        }
    }
}

/// Move a bet to `next`. Contract storage is authoritative, so a transition
/// outside the expected machine is logged and still applied.
pub(crate) fn transition(bet: &mut Bet, next: BetState, event: &str) {
    if !bet.state.can_transition_to(next) {
        tracing::warn!(
            bet = %bet.id,
            from = %bet.state,
            to = %next,
            event,
            "Unexpected bet state transition"
        );
    }
    bet.state = next;
}

/// OR the contract's vote/evidence flags into the entity. Flags never reset.
pub(crate) fn merge_flags(bet: &mut Bet, flags: Option<VoteEvidenceFlags>) {
    if let Some(flags) = flags {
        bet.creator_has_voted |= flags.creator_has_voted;
        bet.backer_has_voted |= flags.backer_has_voted;
        bet.creator_provided_evidence |= flags.creator_provided_evidence;
        bet.backer_provided_evidence |= flags.backer_provided_evidence;
    }
}

/// Error for an event routed to a handler of another type.
pub(crate) fn misrouted(handler: &str, event: &GambleEvent) -> BoardError {
    BoardError::InvalidState(format!(
        "{} handler received {} event",
        handler,
        event.name()
    ))
}
