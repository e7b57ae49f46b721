//! Betboard: an event-driven bet lifecycle indexer for gamble board contracts
//!
//! Betboard consumes the ordered log stream of a single gamble board
//! contract and maintains a queryable projection:
//! - **Bets**: one per on-chain bet, following its lifecycle from creation
//!   through placing, voting, dispute and ruling
//! - **Fixtures**: bets on the same proposition, taxonomy and day
//! - **Leagues**: distinct (country, category, league) triples
//!
//! Each event is projected by one handler against a contract snapshot frozen
//! at the event's block, and its writes commit atomically with its position.
//!
//! # Quick Start
//!
//! ```no_run
//! use betboard::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let board = BetBoard::open("./data/betboard.db")?;
//! let state = Arc::new(MemoryContractState::from_file("state.json")?);
//! let source = JsonLinesSource::open("logs.jsonl")?;
//!
//! let mut processor = board.processor(state, source).build()?;
//! let stats = processor.drain()?;
//! println!("applied {} events", stats.applied);
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod context;
pub mod contract_state;
pub mod dead_letter_queue;
pub mod decoder;
pub mod event_handler;
pub mod event_processor;
pub mod handlers;
pub mod memory_store;
pub mod prelude;
pub mod source;

// Re-export core types
pub use betboard_core::{
    address_hex, bet_key, day_bucket,
    config::{ErrorPolicy, IndexerConfig, StoreConfig, SynchronousMode},
    error::{BoardError, Result},
    traits::{ChangeSet, ContractReader, ContractSnapshot, EntityCounts, EntityStore},
    types::{
        Bet, BetId, BetRecord, BetState, DecodedEvent, EventEnvelope, EventPosition, Fixture,
        FixtureKey, GambleEvent, League, LeagueKey, VoteEvidenceFlags,
    },
};

// Re-export implementations
pub use betboard_sqlite::SqliteEntityStore;

// Re-export main types from this crate
pub use board::{BetBoard, BoardStatus};
pub use context::ProjectionContext;
pub use contract_state::{ContractStateFile, MemoryContractState};
pub use dead_letter_queue::{DeadLetterQueue, FailedEvent};
pub use decoder::{LogDecoder, RawLog};
pub use event_handler::{EventHandler, EventHandlerRegistry};
pub use event_processor::{
    ErrorAction, ErrorStrategy, EventProcessor, EventProcessorBuilder, ProcessorStats,
    ShutdownHandle,
};
pub use memory_store::MemoryStore;
pub use source::{JsonLinesSource, LogSource, SourceItem, VecSource};
