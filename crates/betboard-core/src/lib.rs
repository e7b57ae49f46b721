//! Betboard Core: types and traits for the gamble board indexer
//!
//! This crate defines the core abstractions for projecting gamble board
//! contract events into a queryable store:
//! - Entities: bets, fixtures (bets grouped by proposition, taxonomy and day)
//!   and leagues
//! - Events: the typed board events with their chain position
//! - Entity store: load/save-by-id with atomic per-event change sets
//! - Contract reader: point-in-time reads of board storage
//!
//! Key properties:
//! - Events apply in strictly increasing (block, transaction, log) order
//! - Every event's writes commit together with the cursor, or not at all
//! - Contract reads are frozen at the height of the event being applied

pub mod config;
pub mod error;
pub mod observe;
pub mod traits;
pub mod types;

pub use config::{ErrorPolicy, IndexerConfig, StoreConfig, SynchronousMode};
pub use error::{BoardError, Result};
pub use traits::{ChangeSet, ContractReader, ContractSnapshot, EntityCounts, EntityStore};
pub use types::{
    address_hex, bet_key, day_bucket, Bet, BetId, BetRecord, BetState, DecodedEvent,
    EventEnvelope, EventPosition, Fixture, FixtureKey, GambleEvent, League, LeagueKey,
    VoteEvidenceFlags,
};
