//! Betboard Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use betboard::prelude::*;
//! ```

// Core types
pub use crate::{
    Bet, BetId, BetRecord, BetState, BoardError, DecodedEvent, EventEnvelope, EventPosition,
    Fixture, GambleEvent, League, Result,
};

// Configs
pub use crate::{ErrorPolicy, IndexerConfig, StoreConfig, SynchronousMode};

// Traits
pub use crate::{ContractReader, EntityStore, LogSource};

// Implementations
pub use crate::{BetBoard, MemoryContractState, MemoryStore, SqliteEntityStore};

// Event handling
pub use crate::{EventHandler, EventHandlerRegistry, ProjectionContext};

// Processing
pub use crate::{
    DeadLetterQueue, ErrorStrategy, EventProcessor, JsonLinesSource, LogDecoder, RawLog,
};

// Re-export common external deps
pub use alloy_primitives::{Address, U256};
pub use anyhow;
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use tracing;
