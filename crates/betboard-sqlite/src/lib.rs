//! SQLite-backed entity store implementation
//!
//! Provides the queryable projection of gamble board events.
//!
//! Key features:
//! - Bets, fixtures (with ordered member bets) and leagues as SQL tables
//! - Cursor tracking for event application
//! - One immediate transaction per event: entity writes and cursor together
//! - WAL mode for readers alongside the indexer

mod rows;
pub mod schema;
pub mod store;
pub mod txn;

pub use store::SqliteEntityStore;
pub use txn::SqliteStoreTxn;
