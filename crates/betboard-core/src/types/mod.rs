pub mod entity;
pub mod event;
pub mod record;
pub mod state;

pub use entity::{
    address_hex, bet_key, day_bucket, Bet, BetId, Fixture, FixtureKey, League, LeagueKey,
    SECONDS_PER_DAY,
};
pub use event::{DecodedEvent, EventEnvelope, EventPosition, GambleEvent};
pub use record::{BetRecord, VoteEvidenceFlags};
pub use state::BetState;
