use super::{misrouted, transition};
use crate::context::ProjectionContext;
use crate::event_handler::EventHandler;
use betboard_core::{
    address_hex, bet_key, Bet, BetId, Fixture, FixtureKey, GambleEvent, League, LeagueKey, Result,
};

/// `BetCreated`: creates the bet from contract storage and merges it into its
/// fixture and league.
pub struct BetCreatedHandler;

impl EventHandler for BetCreatedHandler {
    fn event_type(&self) -> &str {
        "BetCreated"
    }

    fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()> {
        let GambleEvent::BetCreated {
            bet_id,
            country,
            league,
            category,
        } = event
        else {
            return Err(misrouted(self.event_type(), event));
        };

        let record = ctx.snapshot().bet(*bet_id)?;
        let now = ctx.block_time();

        let mut bet = match ctx.bet_opt(*bet_id)? {
            Some(mut existing) => {
                tracing::debug!(bet = %existing.id, "BetCreated replayed for existing bet");
                transition(&mut existing, record.state, self.event_type());
                existing.staking_deadline = record.staking_deadline;
                existing.voting_deadline = record.voting_deadline;
                existing.backer_stake = record.backer_stake;
                existing.creator_stake = record.creator_stake;
                existing.outcome = record.outcome;
                existing.creator = record.creator;
                existing.description = record.description;
                existing.creator_bet_description = record.creator_description;
                existing.country = country.clone();
                existing.league = league.clone();
                existing.category = category.clone();
                existing.touch(now);
                existing
            }
            None => Bet {
                id: bet_key(*bet_id),
                bet_id: *bet_id,
                staking_deadline: record.staking_deadline,
                voting_deadline: record.voting_deadline,
                backer_stake: record.backer_stake,
                creator_stake: record.creator_stake,
                outcome: record.outcome,
                state: record.state,
                creator: record.creator,
                backer: None,
                description: record.description,
                creator_bet_description: record.creator_description,
                country: country.clone(),
                league: league.clone(),
                category: category.clone(),
                dispute_id: None,
                creator_has_voted: false,
                backer_has_voted: false,
                creator_provided_evidence: false,
                backer_provided_evidence: false,
                time_created: now,
                time_updated: now,
                creator_backer: address_hex(record.creator),
                event: String::new(),
                meta_evidence: None,
                evidence: Vec::new(),
            },
        };

        let fixture_key = FixtureKey::for_bet(&bet);
        let previous = std::mem::replace(&mut bet.event, fixture_key.id());
        if !previous.is_empty() && previous != bet.event {
            leave_fixture(ctx, &previous, bet.bet_id)?;
        }

        let fixture_id = fixture_key.id();
        let mut fixture = match ctx.fixture_opt(&fixture_id)? {
            Some(fixture) => fixture,
            None => Fixture::new(&fixture_key, bet.staking_deadline),
        };
        fixture.description = fixture_key.description.clone();
        fixture.merge_bet(bet.bet_id, bet.staking_deadline);

        if !league.is_empty() {
            let league_key = LeagueKey::new(country.clone(), category.clone(), league.clone());
            if ctx.league_opt(&league_key.id())?.is_none() {
                ctx.put_league(League::new(&league_key));
            }
        }

        tracing::debug!(bet = %bet.id, fixture = %fixture.id, "Bet created");
        ctx.put_fixture(fixture);
        ctx.put_bet(bet);
        Ok(())
    }
}

/// Drop a bet from a fixture it no longer belongs to. The fixture's start
/// time is recomputed from the members that remain.
fn leave_fixture(
    ctx: &mut ProjectionContext<'_>,
    fixture_id: &str,
    bet_id: BetId,
) -> Result<()> {
    let Some(mut fixture) = ctx.fixture_opt(fixture_id)? else {
        return Ok(());
    };
    fixture.bet_ids.retain(|id| *id != bet_id);

    let mut start_time: Option<u64> = None;
    for member in &fixture.bet_ids {
        if let Some(member) = ctx.bet_opt(*member)? {
            let deadline = member.staking_deadline;
            start_time = Some(start_time.map_or(deadline, |t| t.min(deadline)));
        }
    }
    if let Some(start_time) = start_time {
        fixture.start_time = start_time;
    }

    tracing::debug!(bet = %bet_key(bet_id), fixture = %fixture.id, "Bet moved out of fixture");
    ctx.put_fixture(fixture);
    Ok(())
}

/// `BetPlaced`: a backer stakes against the creator.
pub struct BetPlacedHandler;

impl EventHandler for BetPlacedHandler {
    fn event_type(&self) -> &str {
        "BetPlaced"
    }

    fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()> {
        let GambleEvent::BetPlaced {
            bet_id,
            state,
            backer,
        } = event
        else {
            return Err(misrouted(self.event_type(), event));
        };

        let mut bet = ctx.bet(*bet_id)?;
        transition(&mut bet, *state, self.event_type());
        bet.backer = Some(*backer);
        bet.creator_backer = format!("{}{}", address_hex(bet.creator), address_hex(*backer));
        bet.touch(ctx.block_time());
        ctx.put_bet(bet);
        Ok(())
    }
}

/// `BetRefund`: stakes are post-refund balances, not deltas.
pub struct BetRefundHandler;

impl EventHandler for BetRefundHandler {
    fn event_type(&self) -> &str {
        "BetRefund"
    }

    fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()> {
        let GambleEvent::BetRefund {
            bet_id,
            state,
            backer_stake,
            creator_stake,
        } = event
        else {
            return Err(misrouted(self.event_type(), event));
        };

        let mut bet = ctx.bet(*bet_id)?;
        transition(&mut bet, *state, self.event_type());
        bet.backer_stake = *backer_stake;
        bet.creator_stake = *creator_stake;
        bet.touch(ctx.block_time());
        ctx.put_bet(bet);
        Ok(())
    }
}

pub struct BetStateChangedHandler;

impl EventHandler for BetStateChangedHandler {
    fn event_type(&self) -> &str {
        "BetStateChanged"
    }

    fn handle(&self, ctx: &mut ProjectionContext<'_>, event: &GambleEvent) -> Result<()> {
        let GambleEvent::BetStateChanged { bet_id, state } = event else {
            return Err(misrouted(self.event_type(), event));
        };

        let mut bet = ctx.bet(*bet_id)?;
        transition(&mut bet, *state, self.event_type());
        bet.touch(ctx.block_time());
        ctx.put_bet(bet);
        Ok(())
    }
}
