use super::{merge_flags, misrouted, transition, Party};
use crate::context::ProjectionContext;
use crate::event_handler::EventHandler;
use betboard_core::{GambleEvent, Result};

/// `BetVotedOn`: outcome and state come from contract storage, where the
/// votes are tallied. The voter is identified by the transaction sender.
pub struct BetVotedOnHandler;

impl EventHandler for BetVotedOnHandler {
    fn event_type(&self) -> &str {
        "BetVotedOn"
    }

    fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()> {
        let GambleEvent::BetVotedOn { bet_id, outcome } = event else {
            return Err(misrouted(self.event_type(), event));
        };

        let mut bet = ctx.bet(*bet_id)?;
        let snapshot = ctx.snapshot();
        let stored_outcome = snapshot.outcome(*bet_id)?;
        let state = snapshot.state(*bet_id)?;

        if stored_outcome.is_some_and(|o| o != *outcome) {
            tracing::debug!(
                bet = %bet.id,
                voted = outcome,
                stored = ?stored_outcome,
                "Vote differs from stored outcome"
            );
        }

        bet.outcome = stored_outcome;
        transition(&mut bet, state, self.event_type());
        match Party::of(&bet, ctx.sender()) {
            Some(Party::Creator) => bet.creator_has_voted = true,
            Some(Party::Backer) => bet.backer_has_voted = true,
            None => {
                tracing::debug!(bet = %bet.id, sender = %ctx.sender(), "Vote from non-party");
            }
        }
        merge_flags(&mut bet, snapshot.vote_evidence_flags(*bet_id)?);
        bet.touch(ctx.block_time());
        ctx.put_bet(bet);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use alloy_primitives::{Address, U256};
    use betboard_core::{BetState, BoardError, EntityStore, GambleEvent, VoteEvidenceFlags};

    fn voting(h: &mut Harness, id: u64, outcome: Option<i32>) {
        let mut voted = record(BetState::Voting);
        voted.backer = backer();
        voted.outcome = outcome;
        h.state.record_bet(h.next_block(), U256::from(id), voted);
    }

    fn vote(h: &mut Harness, id: u64, sender: Address) {
        h.apply(
            GambleEvent::BetVotedOn {
                bet_id: U256::from(id),
                outcome: 1,
            },
            sender,
        )
        .unwrap();
    }

    #[test]
    fn test_creator_vote_sets_creator_flag_only() {
        let mut h = Harness::new();
        h.create(1).unwrap();
        h.place(1).unwrap();
        voting(&mut h, 1, None);
        vote(&mut h, 1, creator());

        let bet = h.store.load_bet("0x1").unwrap().unwrap();
        assert!(bet.creator_has_voted);
        assert!(!bet.backer_has_voted);
        assert_eq!(bet.state, BetState::Voting);
        assert_eq!(bet.outcome, None);
    }

    #[test]
    fn test_backer_vote_takes_stored_outcome() {
        let mut h = Harness::new();
        h.create(1).unwrap();
        h.place(1).unwrap();
        voting(&mut h, 1, Some(2));
        vote(&mut h, 1, backer());

        let bet = h.store.load_bet("0x1").unwrap().unwrap();
        assert!(!bet.creator_has_voted);
        assert!(bet.backer_has_voted);
        assert_eq!(bet.outcome, Some(2));
    }

    #[test]
    fn test_stranger_vote_is_a_no_op_for_flags() {
        let mut h = Harness::new();
        h.create(1).unwrap();
        h.place(1).unwrap();
        voting(&mut h, 1, None);
        vote(&mut h, 1, stranger());

        let bet = h.store.load_bet("0x1").unwrap().unwrap();
        assert!(!bet.creator_has_voted);
        assert!(!bet.backer_has_voted);
        assert_eq!(bet.state, BetState::Voting);
    }

    #[test]
    fn test_earlier_schema_flags_are_merged() {
        let mut h = Harness::new();
        h.create(1).unwrap();
        h.place(1).unwrap();
        voting(&mut h, 1, None);
        h.state.record_vote_evidence_flags(
            h.next_block(),
            U256::from(1),
            VoteEvidenceFlags {
                backer_provided_evidence: true,
                ..Default::default()
            },
        );
        vote(&mut h, 1, creator());

        let bet = h.store.load_bet("0x1").unwrap().unwrap();
        assert!(bet.creator_has_voted);
        assert!(bet.backer_provided_evidence);
        assert!(!bet.backer_has_voted);
    }

    #[test]
    fn test_vote_for_unknown_bet() {
        let mut h = Harness::new();
        let err = h
            .apply(
                GambleEvent::BetVotedOn {
                    bet_id: U256::from(4),
                    outcome: 0,
                },
                creator(),
            )
            .unwrap_err();
        assert!(matches!(err, BoardError::MissingEntity { .. }));
    }
}
