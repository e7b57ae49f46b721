//! Arbitrable (ERC-792) and evidence (ERC-1497) events.
//!
//! The board uses the bet id as evidence group id and meta-evidence id, so
//! `Dispute`, `Evidence` and `MetaEvidence` address bets directly. A
//! `Ruling` only names the dispute and is resolved through the contract's
//! reverse lookup.

use super::{merge_flags, misrouted, transition, Party};
use crate::context::ProjectionContext;
use crate::event_handler::EventHandler;
use betboard_core::{BetState, BoardError, GambleEvent, Result};

/// `Dispute`: marks the bet disputed and refreshes stakes, which change as
/// arbitration fees are deposited.
pub struct DisputeHandler;

impl EventHandler for DisputeHandler {
    fn event_type(&self) -> &str {
        "Dispute"
    }

    fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()> {
        let GambleEvent::Dispute { bet_id, dispute_id } = event else {
            return Err(misrouted(self.event_type(), event));
        };

        let mut bet = ctx.bet(*bet_id)?;
        let record = ctx.snapshot().bet(*bet_id)?;
        transition(&mut bet, BetState::Disputed, self.event_type());
        bet.dispute_id = Some(*dispute_id);
        bet.backer_stake = record.backer_stake;
        bet.creator_stake = record.creator_stake;
        bet.touch(ctx.block_time());
        tracing::debug!(bet = %bet.id, dispute = %dispute_id, "Bet disputed");
        ctx.put_bet(bet);
        Ok(())
    }
}

/// `Evidence`: records who submitted evidence and the evidence URI.
pub struct EvidenceHandler;

impl EventHandler for EvidenceHandler {
    fn event_type(&self) -> &str {
        "Evidence"
    }

    fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()> {
        let GambleEvent::Evidence {
            bet_id,
            party,
            evidence,
        } = event
        else {
            return Err(misrouted(self.event_type(), event));
        };

        let mut bet = ctx.bet(*bet_id)?;
        let snapshot = ctx.snapshot();
        bet.outcome = snapshot.outcome(*bet_id)?;
        let state = snapshot.state(*bet_id)?;
        transition(&mut bet, state, self.event_type());

        if *party != ctx.sender() {
            tracing::debug!(
                bet = %bet.id,
                %party,
                sender = %ctx.sender(),
                "Evidence party differs from sender"
            );
        }
        match Party::of(&bet, ctx.sender()) {
            Some(Party::Creator) => bet.creator_provided_evidence = true,
            Some(Party::Backer) => bet.backer_provided_evidence = true,
            None => {}
        }
        merge_flags(&mut bet, snapshot.vote_evidence_flags(*bet_id)?);

        if !bet.evidence.contains(evidence) {
            bet.evidence.push(evidence.clone());
        }
        bet.touch(ctx.block_time());
        ctx.put_bet(bet);
        Ok(())
    }
}

/// `Ruling`: the arbitrator's final decision.
pub struct RulingHandler;

impl EventHandler for RulingHandler {
    fn event_type(&self) -> &str {
        "Ruling"
    }

    fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()> {
        let GambleEvent::Ruling { dispute_id, ruling } = event else {
            return Err(misrouted(self.event_type(), event));
        };

        let outcome = i32::try_from(*ruling).map_err(|_| {
            BoardError::Decode(format!(
                "Ruling {} for dispute {} does not fit an outcome",
                ruling, dispute_id
            ))
        })?;
        let bet_id = ctx.snapshot().dispute_bet_id(*dispute_id)?;

        let mut bet = ctx.bet(bet_id)?;
        transition(&mut bet, BetState::Agreement, self.event_type());
        bet.outcome = Some(outcome);
        bet.touch(ctx.block_time());
        tracing::debug!(bet = %bet.id, dispute = %dispute_id, outcome, "Dispute ruled");
        ctx.put_bet(bet);
        Ok(())
    }
}

/// `MetaEvidence`: attaches the meta-evidence URI to the bet it aliases.
pub struct MetaEvidenceHandler;

impl EventHandler for MetaEvidenceHandler {
    fn event_type(&self) -> &str {
        "MetaEvidence"
    }

    fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()> {
        let GambleEvent::MetaEvidence { bet_id, evidence } = event else {
            return Err(misrouted(self.event_type(), event));
        };

        let mut bet = ctx.bet(*bet_id)?;
        bet.meta_evidence = Some(evidence.clone());
        bet.touch(ctx.block_time());
        ctx.put_bet(bet);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use alloy_primitives::U256;
    use betboard_core::{BetState, BoardError, EntityStore, GambleEvent};

    fn dispute(h: &mut Harness, id: u64, dispute_id: u64) {
        let mut disputed = record(BetState::Disputed);
        disputed.backer = backer();
        disputed.backer_stake = U256::from(1_100u64);
        disputed.creator_stake = U256::from(1_100u64);
        h.state.record_bet(h.next_block(), U256::from(id), disputed);
        h.state
            .record_dispute(h.next_block(), U256::from(dispute_id), U256::from(id));
        h.apply(
            GambleEvent::Dispute {
                bet_id: U256::from(id),
                dispute_id: U256::from(dispute_id),
            },
            backer(),
        )
        .unwrap();
    }

    #[test]
    fn test_dispute_records_id_and_refreshes_stakes() {
        let mut h = Harness::new();
        h.create(5).unwrap();
        h.place(5).unwrap();
        dispute(&mut h, 5, 40);

        let bet = h.store.load_bet("0x5").unwrap().unwrap();
        assert_eq!(bet.state, BetState::Disputed);
        assert_eq!(bet.dispute_id, Some(U256::from(40)));
        assert_eq!(bet.backer_stake, U256::from(1_100u64));
        assert_eq!(bet.creator_stake, U256::from(1_100u64));
    }

    #[test]
    fn test_ruling_resolves_through_dispute_lookup() {
        let mut h = Harness::new();
        h.create(5).unwrap();
        dispute(&mut h, 5, 40);
        h.apply(
            GambleEvent::Ruling {
                dispute_id: U256::from(40),
                ruling: U256::from(1),
            },
            stranger(),
        )
        .unwrap();

        let bet = h.store.load_bet("0x5").unwrap().unwrap();
        assert_eq!(bet.state, BetState::Agreement);
        assert_eq!(bet.outcome, Some(1));
    }

    #[test]
    fn test_oversized_ruling_is_a_decode_error() {
        let mut h = Harness::new();
        h.create(5).unwrap();
        dispute(&mut h, 5, 40);
        let err = h
            .apply(
                GambleEvent::Ruling {
                    dispute_id: U256::from(40),
                    ruling: U256::from(u64::MAX),
                },
                stranger(),
            )
            .unwrap_err();
        assert!(matches!(err, BoardError::Decode(_)));
    }

    #[test]
    fn test_ruling_for_unknown_dispute_is_a_read_error() {
        let mut h = Harness::new();
        h.create(5).unwrap();
        let err = h
            .apply(
                GambleEvent::Ruling {
                    dispute_id: U256::from(41),
                    ruling: U256::from(1),
                },
                stranger(),
            )
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_evidence_attribution_and_uri() {
        let mut h = Harness::new();
        h.create(5).unwrap();
        h.place(5).unwrap();
        for _ in 0..2 {
            h.apply(
                GambleEvent::Evidence {
                    bet_id: U256::from(5),
                    party: creator(),
                    evidence: "/ipfs/QmCreator".into(),
                },
                creator(),
            )
            .unwrap();
        }
        h.apply(
            GambleEvent::Evidence {
                bet_id: U256::from(5),
                party: stranger(),
                evidence: "/ipfs/QmStranger".into(),
            },
            stranger(),
        )
        .unwrap();

        let bet = h.store.load_bet("0x5").unwrap().unwrap();
        assert!(bet.creator_provided_evidence);
        assert!(!bet.backer_provided_evidence);
        assert_eq!(bet.evidence, vec!["/ipfs/QmCreator", "/ipfs/QmStranger"]);
    }

    #[test]
    fn test_meta_evidence_requires_bet() {
        let mut h = Harness::new();
        let err = h
            .apply(
                GambleEvent::MetaEvidence {
                    bet_id: U256::from(5),
                    evidence: "/ipfs/QmMeta".into(),
                },
                creator(),
            )
            .unwrap_err();
        assert!(matches!(err, BoardError::MissingEntity { .. }));

        h.create(5).unwrap();
        h.apply(
            GambleEvent::MetaEvidence {
                bet_id: U256::from(5),
                evidence: "/ipfs/QmMeta".into(),
            },
            creator(),
        )
        .unwrap();
        let bet = h.store.load_bet("0x5").unwrap().unwrap();
        assert_eq!(bet.meta_evidence.as_deref(), Some("/ipfs/QmMeta"));
        assert_eq!(bet.state, BetState::Created);
    }

    #[test]
    fn test_arbitration_before_creation_is_missing_entity() {
        let mut h = Harness::new();
        h.state
            .record_dispute(h.next_block() + 1, U256::from(40), U256::from(5));
        let dispute = h.apply(
            GambleEvent::Dispute {
                bet_id: U256::from(5),
                dispute_id: U256::from(40),
            },
            backer(),
        );
        assert!(matches!(dispute, Err(BoardError::MissingEntity { .. })));

        let ruling = h.apply(
            GambleEvent::Ruling {
                dispute_id: U256::from(40),
                ruling: U256::from(1),
            },
            stranger(),
        );
        assert!(matches!(ruling, Err(BoardError::MissingEntity { .. })));

        let evidence = h.apply(
            GambleEvent::Evidence {
                bet_id: U256::from(5),
                party: creator(),
                evidence: "/ipfs/Qm".into(),
            },
            creator(),
        );
        assert!(matches!(evidence, Err(BoardError::MissingEntity { .. })));
        assert_eq!(h.store.counts().unwrap().bets, 0);
    }
}
